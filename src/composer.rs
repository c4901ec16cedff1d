//! Card composer stage.
//!
//! Lays out one card per identifier: shared background, centered header
//! with the identifier, the encoded code, then title and subtitle from the
//! text table. Shared assets (background, typeface) are loaded once at
//! construction and their absence aborts the run; a missing code image only
//! skips that identifier.

use std::path::PathBuf;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::config::{CardLayout, PipelineConfig};
use crate::encoder::code_filename;
use crate::ident::Identifier;
use crate::output::save_png_with_dpi;
use crate::texts::TextTable;
use crate::typeface::Typeface;

/// Prefix for composed card files; the packer discovers cards by this name.
pub const CARD_PREFIX: &str = "card_";

/// File name of the composed card for an identifier.
pub fn card_filename(id: &Identifier) -> String {
    format!("{CARD_PREFIX}{id}.png")
}

/// Per-identifier outcome of composition.
#[derive(Debug, PartialEq, Eq)]
pub enum ComposeStatus {
    Written(PathBuf),
    /// The identifier's encoded code was not found; nothing was written.
    MissingCode(PathBuf),
}

/// Batch summary across a range of identifiers.
#[derive(Debug, Default)]
pub struct ComposeReport {
    pub written: Vec<Identifier>,
    pub skipped: Vec<Identifier>,
}

/// Composes card images from shared assets and per-identifier codes.
pub struct CardComposer {
    layout: CardLayout,
    codes_dir: PathBuf,
    cards_dir: PathBuf,
    background: RgbaImage,
    header_face: FontVec,
    title_face: FontVec,
    subtitle_face: FontVec,
}

impl CardComposer {
    /// Load shared assets and resolve the three text weights.
    ///
    /// Fails when the background or typeface cannot be read; every card
    /// depends on both, so no partial recovery is meaningful.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let layout = config.card.clone();

        let background = image::open(&config.assets.background)
            .with_context(|| {
                format!(
                    "failed to read background {}",
                    config.assets.background.display()
                )
            })?
            .to_rgba8();
        let background = imageops::resize(
            &background,
            layout.width,
            layout.height,
            FilterType::Lanczos3,
        );

        let typeface = Typeface::load(&config.assets.typeface)?;
        let header_face = typeface.at_weight(layout.header_weight)?;
        let title_face = typeface.at_weight(layout.title_weight)?;
        let subtitle_face = typeface.at_weight(layout.subtitle_weight)?;

        Ok(Self {
            layout,
            codes_dir: config.assets.codes_dir.clone(),
            cards_dir: config.assets.cards_dir.clone(),
            background,
            header_face,
            title_face,
            subtitle_face,
        })
    }

    /// Compose one card, overwriting any previous file for the identifier.
    pub fn compose(&self, id: &Identifier, texts: &TextTable) -> Result<ComposeStatus> {
        let code_path = self.codes_dir.join(code_filename(id));
        if !code_path.exists() {
            return Ok(ComposeStatus::MissingCode(code_path));
        }

        let mut canvas = self.background.clone();
        let ink = Rgba([self.layout.ink[0], self.layout.ink[1], self.layout.ink[2], 0xff]);
        let center_x = (self.layout.width / 2) as i32;

        let header = format!("{} | {}", self.layout.header_text, id);
        draw_centered(
            &mut canvas,
            ink,
            center_x,
            self.layout.header_anchor_y,
            self.layout.header_size,
            &self.header_face,
            &header,
        );

        let code = image::open(&code_path)
            .with_context(|| format!("failed to read code image {}", code_path.display()))?
            .to_rgba8();
        let code = imageops::resize(
            &code,
            self.layout.code_size,
            self.layout.code_size,
            FilterType::Lanczos3,
        );
        let code_x = ((self.layout.width - self.layout.code_size) / 2) as i64;
        imageops::overlay(&mut canvas, &code, code_x, self.layout.code_top);

        let (title, subtitle) = texts.lookup(id);
        draw_centered(
            &mut canvas,
            ink,
            center_x,
            self.layout.title_anchor_y,
            self.layout.title_size,
            &self.title_face,
            title,
        );
        draw_centered(
            &mut canvas,
            ink,
            center_x,
            self.layout.subtitle_anchor_y,
            self.layout.subtitle_size,
            &self.subtitle_face,
            subtitle,
        );

        let path = self.cards_dir.join(card_filename(id));
        let rgb = image::DynamicImage::ImageRgba8(canvas).to_rgb8();
        save_png_with_dpi(&rgb, &path, self.layout.dpi)?;
        Ok(ComposeStatus::Written(path))
    }

    /// Compose a range of identifiers, skipping those without codes and
    /// continuing the batch.
    pub fn compose_range<I>(&self, ids: I, texts: &TextTable) -> Result<ComposeReport>
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut report = ComposeReport::default();
        for id in ids {
            match self.compose(&id, texts)? {
                ComposeStatus::Written(_) => report.written.push(id),
                ComposeStatus::MissingCode(_) => report.skipped.push(id),
            }
        }
        Ok(report)
    }
}

/// Draw text centered on an anchor point, horizontally and vertically.
fn draw_centered(
    canvas: &mut RgbaImage,
    color: Rgba<u8>,
    anchor_x: i32,
    anchor_y: i32,
    size: f32,
    face: &FontVec,
    text: &str,
) {
    let scale = PxScale::from(size);
    let (width, height) = text_size(scale, face, text);
    draw_text_mut(
        canvas,
        color,
        anchor_x - (width as i32) / 2,
        anchor_y - (height as i32) / 2,
        scale,
        face,
        text,
    );
}
