//! Sheet packer stage.
//!
//! Tiles composed cards into a fixed grid on print-size pages, draws trim
//! lines at the gutter midpoints, and assembles every page into one PDF at
//! the configured DPI. Card discovery sorts by file name; because card files
//! embed the zero-padded identifier, that sort is the print order contract.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};

use crate::composer::CARD_PREFIX;
use crate::config::{PipelineConfig, SheetLayout};

/// Summary of a completed packing run.
#[derive(Debug)]
pub struct PackSummary {
    pub cards: usize,
    pub pages: usize,
    pub path: PathBuf,
}

/// Assembles discovered cards into a multi-page print document.
pub struct SheetPacker {
    layout: SheetLayout,
    cards_dir: PathBuf,
    document: PathBuf,
}

impl SheetPacker {
    pub fn new(config: &PipelineConfig) -> Self {
        let mut layout = config.sheet.clone();
        // A grid axis of zero from a config override would divide by
        // zero in the cell formula; treat it as a single cell.
        layout.columns = layout.columns.max(1);
        layout.rows = layout.rows.max(1);
        Self {
            layout,
            cards_dir: config.assets.cards_dir.clone(),
            document: config.assets.document.clone(),
        }
    }

    /// Card files in print order: prefix-matched PNGs sorted by file name.
    ///
    /// The explicit sort, not directory enumeration order, determines the
    /// sequence cards appear on pages.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.cards_dir.exists() {
            return Ok(Vec::new());
        }
        let mut cards = Vec::new();
        let entries = fs::read_dir(&self.cards_dir)
            .with_context(|| format!("failed to list {}", self.cards_dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list {}", self.cards_dir.display()))?
                .path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if name.starts_with(CARD_PREFIX) && name.ends_with(".png") {
                cards.push(path);
            }
        }
        cards.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(cards)
    }

    /// Pack all discovered cards. Returns `None` when there is nothing to
    /// pack; an empty input set is a no-op, not an error.
    pub fn pack(&self) -> Result<Option<PackSummary>> {
        let cards = self.discover()?;
        if cards.is_empty() {
            return Ok(None);
        }

        let per_page = (self.layout.columns * self.layout.rows) as usize;
        let mut pages = Vec::new();
        for group in cards.chunks(per_page) {
            pages.push(self.render_page(group)?);
        }

        self.write_document(&pages)?;
        Ok(Some(PackSummary {
            cards: cards.len(),
            pages: pages.len(),
            path: self.document.clone(),
        }))
    }

    /// Render one full-size page from at most `columns * rows` cards.
    fn render_page(&self, group: &[PathBuf]) -> Result<RgbaImage> {
        let layout = &self.layout;
        let cell_w = cell_size(layout.page_width, layout.margin, layout.gutter, layout.columns);
        let cell_h = cell_size(layout.page_height, layout.margin, layout.gutter, layout.rows);

        let mut page = RgbaImage::from_pixel(
            layout.page_width,
            layout.page_height,
            Rgba([255, 255, 255, 255]),
        );

        for (index, path) in group.iter().enumerate() {
            let col = index as u32 % layout.columns;
            let row = index as u32 / layout.columns;

            let card = image::open(path)
                .with_context(|| format!("failed to read card {}", path.display()))?
                .to_rgba8();
            let (w, h) = fitted_size(card.dimensions(), (cell_w, cell_h));
            let card = if (w, h) != card.dimensions() {
                imageops::resize(&card, w, h, FilterType::Lanczos3)
            } else {
                card
            };

            let cell_x = layout.margin + col * (cell_w + layout.gutter);
            let cell_y = layout.margin + row * (cell_h + layout.gutter);
            let x = cell_x as i64 + ((cell_w - w) / 2) as i64;
            let y = cell_y as i64 + ((cell_h - h) / 2) as i64;
            imageops::overlay(&mut page, &card, x, y);
        }

        self.draw_trim_lines(&mut page, cell_w, cell_h);
        Ok(page)
    }

    /// Trim guides at the midpoint of each internal gutter, margin to
    /// margin. Purely geometric: drawn whether or not adjacent cells are
    /// occupied.
    fn draw_trim_lines(&self, page: &mut RgbaImage, cell_w: u32, cell_h: u32) {
        let layout = &self.layout;
        let color = Rgba([
            layout.trim_color[0],
            layout.trim_color[1],
            layout.trim_color[2],
            255,
        ]);
        let width = layout.trim_width.max(1);
        let span_h = layout.page_height - 2 * layout.margin;
        let span_w = layout.page_width - 2 * layout.margin;

        for col in 1..layout.columns {
            let x = trim_offset(layout.margin, cell_w, layout.gutter, col);
            draw_filled_rect_mut(
                page,
                Rect::at(x as i32 - (width / 2) as i32, layout.margin as i32)
                    .of_size(width, span_h),
                color,
            );
        }
        for row in 1..layout.rows {
            let y = trim_offset(layout.margin, cell_h, layout.gutter, row);
            draw_filled_rect_mut(
                page,
                Rect::at(layout.margin as i32, y as i32 - (width / 2) as i32)
                    .of_size(span_w, width),
                color,
            );
        }
    }

    /// Assemble rendered pages into one PDF at the configured physical size.
    fn write_document(&self, pages: &[RgbaImage]) -> Result<()> {
        let layout = &self.layout;
        let width_mm = px_to_mm(layout.page_width, layout.dpi);
        let height_mm = px_to_mm(layout.page_height, layout.dpi);

        let (doc, first_page, first_layer) =
            PdfDocument::new("hub print cards", Mm(width_mm), Mm(height_mm), "cards");

        for (index, page_image) in pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(Mm(width_mm), Mm(height_mm), "cards");
                doc.get_page(page).get_layer(layer)
            };

            let rgb = image::DynamicImage::ImageRgba8(page_image.clone()).to_rgb8();
            let xobject = ImageXObject {
                width: Px(rgb.width() as usize),
                height: Px(rgb.height() as usize),
                color_space: ColorSpace::Rgb,
                bits_per_component: ColorBits::Bit8,
                interpolate: false,
                image_data: rgb.into_raw(),
                image_filter: None,
                clipping_bbox: None,
                smask: None,
            };
            Image::from(xobject).add_to_layer(
                layer,
                ImageTransform {
                    translate_x: Some(Mm(0.0)),
                    translate_y: Some(Mm(0.0)),
                    dpi: Some(layout.dpi as f32),
                    ..Default::default()
                },
            );
        }

        if let Some(parent) = self.document.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create output directory {}", parent.display())
                })?;
            }
        }
        let file = File::create(&self.document)
            .with_context(|| format!("failed to create {}", self.document.display()))?;
        let mut writer = BufWriter::new(file);
        doc.save(&mut writer)
            .map_err(|err| anyhow!("failed to write {}: {err}", self.document.display()))?;
        Ok(())
    }
}

/// Usable cell extent along one axis.
fn cell_size(page: u32, margin: u32, gutter: u32, count: u32) -> u32 {
    (page - 2 * margin - gutter * (count - 1)) / count
}

/// Scale a card to fit its cell, preserving aspect ratio, never upscaling.
fn fitted_size(card: (u32, u32), cell: (u32, u32)) -> (u32, u32) {
    let (w, h) = card;
    if w <= cell.0 && h <= cell.1 {
        return (w, h);
    }
    let scale = (cell.0 as f64 / w as f64).min(cell.1 as f64 / h as f64);
    (
        ((w as f64 * scale) as u32).max(1),
        ((h as f64 * scale) as u32).max(1),
    )
}

/// Pixel offset of the trim line after the `index`-th cell along one axis.
fn trim_offset(margin: u32, cell: u32, gutter: u32, index: u32) -> u32 {
    margin + index * cell + (index - 1) * gutter + gutter / 2
}

fn px_to_mm(px: u32, dpi: u32) -> f32 {
    px as f32 * 25.4 / dpi as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn cell_size_matches_grid_formula() {
        // A4 at 300 DPI, 2x2, margin 90, gutter 80.
        assert_eq!(cell_size(2480, 90, 80, 2), 1110);
        assert_eq!(cell_size(3508, 90, 80, 2), 1624);
        // Single column has no gutters.
        assert_eq!(cell_size(1000, 100, 50, 1), 800);
    }

    #[test]
    fn smaller_cards_are_never_upscaled() {
        assert_eq!(fitted_size((400, 600), (1110, 1624)), (400, 600));
        assert_eq!(fitted_size((1110, 1624), (1110, 1624)), (1110, 1624));
    }

    #[test]
    fn oversized_cards_scale_down_preserving_aspect() {
        let (w, h) = fitted_size((1240, 1748), (1110, 1624));
        assert!(w <= 1110 && h <= 1624);
        let input_aspect = 1240.0 / 1748.0;
        let output_aspect = w as f64 / h as f64;
        assert!((input_aspect - output_aspect).abs() < 0.01);
        // Width is the binding axis here.
        assert_eq!(w, 1110);
    }

    #[test]
    fn trim_lines_sit_at_gutter_midpoints() {
        // First internal gutter after one 1110px cell: 90 + 1110 + 40.
        assert_eq!(trim_offset(90, 1110, 80, 1), 1240);
        assert_eq!(trim_offset(90, 1624, 80, 1), 1754);
    }

    #[test]
    fn a4_physical_size_round_trips() {
        assert!((px_to_mm(2480, 300) - 209.97).abs() < 0.05);
        assert!((px_to_mm(3508, 300) - 297.0).abs() < 0.05);
    }

    #[test]
    fn discovery_is_sorted_and_prefix_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.assets.cards_dir = dir.path().to_path_buf();
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));
        for name in ["card_003.png", "card_001.png", "card_002.png", "hub_001.png"] {
            img.save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let packer = SheetPacker::new(&config);
        let names: Vec<String> = packer
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["card_001.png", "card_002.png", "card_003.png"]);
    }

    #[test]
    fn empty_directory_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.assets.cards_dir = dir.path().join("cards");
        config.assets.document = dir.path().join("out.pdf");
        let packer = SheetPacker::new(&config);
        assert!(packer.pack().unwrap().is_none());
        assert!(!config.assets.document.exists());
    }

    #[test]
    fn five_cards_in_a_2x2_grid_make_two_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.assets.cards_dir = dir.path().join("cards");
        config.assets.document = dir.path().join("out/print.pdf");
        // Small geometry keeps the test fast.
        config.sheet.page_width = 400;
        config.sheet.page_height = 600;
        config.sheet.margin = 20;
        config.sheet.gutter = 10;

        std::fs::create_dir_all(&config.assets.cards_dir).unwrap();
        let card = image::RgbImage::from_pixel(60, 90, image::Rgb([10, 10, 10]));
        for i in 1..=5 {
            card.save(config.assets.cards_dir.join(format!("card_{i:03}.png")))
                .unwrap();
        }

        let packer = SheetPacker::new(&config);
        let summary = packer.pack().unwrap().expect("cards were present");
        assert_eq!(summary.cards, 5);
        assert_eq!(summary.pages, 2);
        assert!(summary.path.exists());
        assert!(std::fs::metadata(&summary.path).unwrap().len() > 0);
    }

    #[test]
    fn zero_grid_dimensions_fall_back_to_one_cell() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.assets.cards_dir = dir.path().join("cards");
        config.assets.document = dir.path().join("out.pdf");
        config.sheet.page_width = 300;
        config.sheet.page_height = 400;
        config.sheet.margin = 20;
        config.sheet.gutter = 10;
        config.sheet.columns = 0;
        config.sheet.rows = 0;

        std::fs::create_dir_all(&config.assets.cards_dir).unwrap();
        let card = image::RgbImage::from_pixel(40, 50, image::Rgb([10, 10, 10]));
        for i in 1..=2 {
            card.save(config.assets.cards_dir.join(format!("card_{i:03}.png")))
                .unwrap();
        }

        let packer = SheetPacker::new(&config);
        let summary = packer.pack().unwrap().expect("cards were present");
        assert_eq!(summary.cards, 2);
        assert_eq!(summary.pages, 2);
        assert!(summary.path.exists());
    }

    #[test]
    fn rendered_page_is_full_size_with_trim_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.assets.cards_dir = dir.path().to_path_buf();
        config.sheet.page_width = 400;
        config.sheet.page_height = 600;
        config.sheet.margin = 20;
        config.sheet.gutter = 10;

        let card_path = dir.path().join("card_001.png");
        image::RgbImage::from_pixel(30, 40, image::Rgb([10, 10, 10]))
            .save(&card_path)
            .unwrap();

        let packer = SheetPacker::new(&config);
        let page = packer.render_page(&[card_path]).unwrap();
        assert_eq!(page.dimensions(), (400, 600));

        // Vertical trim line midway through the single internal gutter,
        // drawn even though the right column is empty.
        let cell_w = cell_size(400, 20, 10, 2);
        let x = trim_offset(20, cell_w, 10, 1);
        let trim = Rgba([180, 180, 180, 255]);
        assert_eq!(page.get_pixel(x, 300), &trim);
        // Outside the margins the page stays white.
        assert_eq!(page.get_pixel(x, 5), &Rgba([255, 255, 255, 255]));
    }
}
