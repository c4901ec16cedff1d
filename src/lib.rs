//! Core library for the hub card print-collateral pipeline.
//!
//! Three stages run as a linear batch: the code encoder writes QR images,
//! the card composer lays them onto branded A6 cards, and the sheet packer
//! tiles finished cards into a print-ready A4 PDF. Stages communicate only
//! through file naming conventions (`hub_<id>.png`, `card_<id>.png`).

mod composer;
mod config;
mod encoder;
mod ident;
mod output;
mod packer;
mod texts;
mod typeface;

pub use composer::{CARD_PREFIX, CardComposer, ComposeReport, ComposeStatus, card_filename};
pub use config::{
    AssetPaths, BatchConfig, CardLayout, Correction, EmblemConfig, EncoderConfig, PipelineConfig,
    SheetLayout,
};
pub use encoder::{
    CODE_PREFIX, CodeEncoder, EmblemStatus, EncodeError, EncodeOutcome, code_filename,
};
pub use ident::{Identifier, id_range};
pub use output::{read_png_dpi, save_png_with_dpi};
pub use packer::{PackSummary, SheetPacker};
pub use texts::{CardText, DEFAULT_SUBTITLE, DEFAULT_TITLE, TextTable};
pub use typeface::{Typeface, WeightAxis};
