//! Command-line interface wiring for the `hubcards` binary.
//!
//! This module owns the clap definitions and delegates execution to
//! specialized submodules that encapsulate each pipeline stage.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod all;
pub mod common;
pub mod compose;
pub mod encode;
pub mod pack;

/// Parsed CLI entrypoint for the `hubcards` binary.
#[derive(Parser, Debug)]
#[command(
    name = "hubcards",
    version,
    about = "Generate QR codes, composed hub cards, and print-ready PDF sheets"
)]
pub struct Cli {
    /// Stage to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline stages made available to end users.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode QR codes for the batch range.
    Encode(encode::EncodeArgs),
    /// Compose cards from encoded codes and the text table.
    Compose(compose::ComposeArgs),
    /// Pack composed cards into the print document.
    Pack(pack::PackArgs),
    /// Run encode, compose, and pack in order.
    All(all::AllArgs),
}

/// Execute the requested command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Encode(args) => encode::handle(args),
        Command::Compose(args) => compose::handle(args),
        Command::Pack(args) => pack::handle(args),
        Command::All(args) => all::handle(args),
    }
}
