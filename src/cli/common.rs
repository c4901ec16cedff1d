//! Shared clap helper types and config plumbing for CLI commands.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use hubcards::{Correction, PipelineConfig, TextTable};

/// Error-correction levels accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CorrectionArg {
    Low,
    Medium,
    Quartile,
    High,
}

impl From<CorrectionArg> for Correction {
    fn from(value: CorrectionArg) -> Correction {
        match value {
            CorrectionArg::Low => Correction::Low,
            CorrectionArg::Medium => Correction::Medium,
            CorrectionArg::Quartile => Correction::Quartile,
            CorrectionArg::High => Correction::High,
        }
    }
}

/// Flags shared by every stage command.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Configuration file (JSON); defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the start of the identifier range.
    #[arg(long)]
    pub start: Option<u32>,

    /// Override the end of the identifier range.
    #[arg(long)]
    pub end: Option<u32>,
}

impl CommonArgs {
    /// Load the configuration, from file when given.
    pub fn load_config(&self) -> Result<PipelineConfig> {
        match &self.config {
            Some(path) => PipelineConfig::load(path),
            None => Ok(PipelineConfig::default()),
        }
    }

    /// Apply range overrides to a configured (start, end) pair.
    pub fn range(&self, configured: (u32, u32)) -> (u32, u32) {
        (
            self.start.unwrap_or(configured.0),
            self.end.unwrap_or(configured.1),
        )
    }
}

/// Resolve the card-text table: an external JSON file or the built-in one.
pub fn load_texts(path: Option<&PathBuf>) -> Result<TextTable> {
    match path {
        Some(path) => TextTable::from_json_file(path),
        None => Ok(TextTable::builtin()),
    }
}
