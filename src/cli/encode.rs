//! Encoding command (`hubcards encode`).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use hubcards::{CodeEncoder, EmblemStatus, PipelineConfig, id_range};

use crate::cli::common::{CommonArgs, CorrectionArg};

/// Args for `hubcards encode`.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override the codes output directory.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Override the configured error-correction level.
    #[arg(long, value_enum)]
    pub correction: Option<CorrectionArg>,
}

/// Execute the encode command.
pub fn handle(args: EncodeArgs) -> Result<()> {
    let mut config = args.common.load_config()?;
    if let Some(dir) = args.output {
        config.assets.codes_dir = dir;
    }
    if let Some(level) = args.correction {
        config.encoder.correction = level.into();
    }
    let (start, end) = args
        .common
        .range((config.batch.encode_start, config.batch.encode_end));

    let count = run_encode(&config, start, end)?;
    println!(
        "Encoded {} code(s) to {}",
        count,
        config.assets.codes_dir.display()
    );
    Ok(())
}

/// Encode the range, reporting degraded outputs; shared by `all`.
pub fn run_encode(config: &PipelineConfig, start: u32, end: u32) -> Result<usize> {
    let encoder = CodeEncoder::new(config)?;
    let mut count = 0usize;
    for id in id_range(start, end, config.batch.digits) {
        let outcome = encoder.encode(&id)?;
        if let EmblemStatus::Missing(path) = &outcome.emblem {
            eprintln!(
                "warning: emblem {} not found; code {} written without it",
                path.display(),
                id
            );
        }
        count += 1;
    }
    Ok(count)
}
