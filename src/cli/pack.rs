//! Packing command (`hubcards pack`).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use hubcards::{PipelineConfig, SheetPacker};

use crate::cli::common::CommonArgs;

/// Args for `hubcards pack`.
#[derive(Args, Debug)]
pub struct PackArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override the output document path.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

/// Execute the pack command.
pub fn handle(args: PackArgs) -> Result<()> {
    let mut config = args.common.load_config()?;
    if let Some(path) = args.output {
        config.assets.document = path;
    }
    run_pack(&config)
}

/// Pack discovered cards into the document; shared by `all`.
pub fn run_pack(config: &PipelineConfig) -> Result<()> {
    let packer = SheetPacker::new(config);
    match packer.pack()? {
        Some(summary) => println!(
            "Packed {} card(s) onto {} page(s) in {}",
            summary.cards,
            summary.pages,
            summary.path.display()
        ),
        None => println!(
            "No cards found in {}; nothing to pack",
            config.assets.cards_dir.display()
        ),
    }
    Ok(())
}
