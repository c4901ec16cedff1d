//! Full-pipeline command (`hubcards all`).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::cli::common::{CommonArgs, load_texts};
use crate::cli::{compose, encode, pack};

/// Args for `hubcards all`.
///
/// `--start`/`--end` apply to both the encode and compose ranges; without
/// them each stage keeps its own configured range.
#[derive(Args, Debug)]
pub struct AllArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Replacement card-text table (JSON id -> [title, subtitle]).
    #[arg(long)]
    pub texts: Option<PathBuf>,
}

/// Execute the three stages in pipeline order.
pub fn handle(args: AllArgs) -> Result<()> {
    let config = args.common.load_config()?;
    let texts = load_texts(args.texts.as_ref())?;

    let (encode_start, encode_end) = args
        .common
        .range((config.batch.encode_start, config.batch.encode_end));
    let encoded = encode::run_encode(&config, encode_start, encode_end)?;
    println!(
        "Encoded {} code(s) to {}",
        encoded,
        config.assets.codes_dir.display()
    );

    let (compose_start, compose_end) = args
        .common
        .range((config.batch.compose_start, config.batch.compose_end));
    let report = compose::run_compose(&config, &texts, compose_start, compose_end)?;
    println!(
        "Composed {} card(s) to {}",
        report.written.len(),
        config.assets.cards_dir.display()
    );

    pack::run_pack(&config)
}
