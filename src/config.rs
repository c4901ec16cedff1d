//! Pipeline configuration.
//!
//! Every stage receives its settings from one [`PipelineConfig`] passed in
//! at construction. Defaults carry the production constants; a JSON file
//! can override any subset of fields.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Error-correction strength for encoded codes.
///
/// Stronger levels tolerate more damage and occlusion (including the emblem
/// overlay) at the cost of data capacity per symbol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correction {
    Low,
    Medium,
    Quartile,
    High,
}

/// Filesystem locations for shared assets and stage outputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// Shared card background, stretched to the canvas.
    pub background: PathBuf,
    /// Typeface used for all card text, ideally with a `wght` axis.
    pub typeface: PathBuf,
    /// Where the encoder writes `hub_<id>.png` files.
    pub codes_dir: PathBuf,
    /// Where the composer writes `card_<id>.png` files.
    pub cards_dir: PathBuf,
    /// Final multi-page print document.
    pub document: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            background: PathBuf::from("assets/background.png"),
            typeface: PathBuf::from("assets/fonts/Unbounded-VariableFont_wght.ttf"),
            codes_dir: PathBuf::from("out/codes"),
            cards_dir: PathBuf::from("out/cards"),
            document: PathBuf::from("out/print_cards.pdf"),
        }
    }
}

/// Optional emblem composited over the center of each code.
#[derive(Debug, Clone, Deserialize)]
pub struct EmblemConfig {
    /// PNG with transparency.
    pub path: PathBuf,
    /// Cap on the emblem edge as a fraction of the code edge. 0.22 is a
    /// safe maximum at high error correction.
    pub scale: f32,
}

/// Settings for the code encoder stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Target URL with exactly one `{hub}` placeholder.
    pub url_template: String,
    pub correction: Correction,
    /// Pixels per code module.
    pub module_size: u32,
    /// Quiet-zone width in modules on each side.
    pub quiet_zone: u32,
    pub foreground: [u8; 3],
    pub background: [u8; 3],
    /// Print resolution recorded in the output PNG.
    pub dpi: u32,
    pub emblem: Option<EmblemConfig>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            url_template: "https://support-hubs.yuk0-dev-team.pp.ua/hub/{hub}".into(),
            correction: Correction::High,
            module_size: 12,
            quiet_zone: 4,
            foreground: [0x0e, 0x2f, 0x16],
            background: [0xf5, 0xf5, 0xf0],
            dpi: 300,
            emblem: None,
        }
    }
}

/// Canvas geometry and typography for composed cards.
///
/// All anchors are pixel coordinates on the canvas; text is centered on its
/// anchor both horizontally and vertically.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CardLayout {
    pub width: u32,
    pub height: u32,
    /// Print resolution recorded in the output PNG. 1240x1748 at 300 DPI
    /// is A6.
    pub dpi: u32,
    pub header_text: String,
    pub header_anchor_y: i32,
    pub header_size: f32,
    pub header_weight: f32,
    /// Edge length the code image is resized to on the card.
    pub code_size: u32,
    /// Top edge of the code image.
    pub code_top: i64,
    pub title_anchor_y: i32,
    pub title_size: f32,
    pub title_weight: f32,
    pub subtitle_anchor_y: i32,
    pub subtitle_size: f32,
    pub subtitle_weight: f32,
    pub ink: [u8; 3],
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            width: 1240,
            height: 1748,
            dpi: 300,
            header_text: "SUPPORT HUB".into(),
            header_anchor_y: 320,
            header_size: 38.0,
            header_weight: 700.0,
            code_size: 420,
            code_top: 390,
            title_anchor_y: 930,
            title_size: 80.0,
            title_weight: 700.0,
            subtitle_anchor_y: 1020,
            subtitle_size: 40.0,
            subtitle_weight: 700.0,
            ink: [20, 25, 20],
        }
    }
}

/// Page geometry for the sheet packer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// 2480x3508 at 300 DPI is A4.
    pub page_width: u32,
    pub page_height: u32,
    pub dpi: u32,
    pub columns: u32,
    pub rows: u32,
    pub margin: u32,
    pub gutter: u32,
    pub trim_color: [u8; 3],
    pub trim_width: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            page_width: 2480,
            page_height: 3508,
            dpi: 300,
            columns: 2,
            rows: 2,
            margin: 90,
            gutter: 80,
            trim_color: [180, 180, 180],
            trim_width: 2,
        }
    }
}

/// Identifier ranges processed by default.
///
/// The encoder range deliberately exceeds the compose range so spare codes
/// exist for identifiers without card texts yet; both are plain external
/// configuration and carry no further meaning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub digits: usize,
    pub encode_start: u32,
    pub encode_end: u32,
    pub compose_start: u32,
    pub compose_end: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            digits: 3,
            encode_start: 1,
            encode_end: 50,
            compose_start: 1,
            compose_end: 15,
        }
    }
}

/// Complete configuration handed to every pipeline stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub assets: AssetPaths,
    pub encoder: EncoderConfig,
    pub card: CardLayout,
    pub sheet: SheetLayout,
    pub batch: BatchConfig,
}

impl PipelineConfig {
    /// Load a configuration file, attaching path context to any error.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}
