//! PNG output with print-resolution metadata.
//!
//! The `image` crate's encoder does not write a pHYs chunk, so downstream
//! tools would fall back to guessing physical size from pixel dimensions.
//! Encoding through the `png` crate directly lets us record the DPI.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;

/// Pixels-per-meter for a given DPI, as stored in the pHYs chunk.
fn dpi_to_ppm(dpi: u32) -> u32 {
    (dpi as f64 * 1000.0 / 25.4).round() as u32
}

/// Write an RGB image as PNG carrying an explicit DPI tag.
pub fn save_png_with_dpi(image: &RgbImage, path: &Path, dpi: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {}", parent.display()))?;
        }
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = dpi_to_ppm(dpi);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder
        .write_header()
        .with_context(|| format!("failed to write PNG header for {}", path.display()))?;
    writer
        .write_image_data(image.as_raw())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Read back the DPI recorded in a PNG written by [`save_png_with_dpi`].
pub fn read_png_dpi(path: &Path) -> Result<Option<u32>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let decoder = png::Decoder::new(std::io::BufReader::new(file));
    let reader = decoder
        .read_info()
        .with_context(|| format!("failed to decode {}", path.display()))?;
    let dims = reader.info().pixel_dims;
    Ok(dims.and_then(|d| match d.unit {
        png::Unit::Meter => Some((d.xppu as f64 * 25.4 / 1000.0).round() as u32),
        png::Unit::Unspecified => None,
    }))
}
