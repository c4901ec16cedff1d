//! Composition command (`hubcards compose`).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use hubcards::{CardComposer, ComposeReport, PipelineConfig, TextTable, id_range};

use crate::cli::common::{CommonArgs, load_texts};

/// Args for `hubcards compose`.
#[derive(Args, Debug)]
pub struct ComposeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override the cards output directory.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Replacement card-text table (JSON id -> [title, subtitle]).
    #[arg(long)]
    pub texts: Option<PathBuf>,
}

/// Execute the compose command.
pub fn handle(args: ComposeArgs) -> Result<()> {
    let mut config = args.common.load_config()?;
    if let Some(dir) = args.output {
        config.assets.cards_dir = dir;
    }
    let texts = load_texts(args.texts.as_ref())?;
    let (start, end) = args
        .common
        .range((config.batch.compose_start, config.batch.compose_end));

    let report = run_compose(&config, &texts, start, end)?;
    println!(
        "Composed {} card(s) to {}",
        report.written.len(),
        config.assets.cards_dir.display()
    );
    Ok(())
}

/// Compose the range and report skipped identifiers; shared by `all`.
pub fn run_compose(
    config: &PipelineConfig,
    texts: &TextTable,
    start: u32,
    end: u32,
) -> Result<ComposeReport> {
    let composer = CardComposer::new(config)?;
    let report = composer.compose_range(id_range(start, end, config.batch.digits), texts)?;
    for id in &report.skipped {
        eprintln!("warning: no encoded code for {id}; card skipped");
    }
    Ok(report)
}
