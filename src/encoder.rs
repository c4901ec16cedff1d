//! Code encoder stage.
//!
//! Turns an identifier into a scannable QR image for its hub URL. The
//! symbol version is auto-selected as the smallest that fits the URL at the
//! requested error-correction level; the module raster is drawn directly so
//! module size, quiet-zone width, and colors all come from configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode, Version};
use thiserror::Error;

use crate::config::{Correction, EmblemConfig, EncoderConfig, PipelineConfig};
use crate::ident::Identifier;
use crate::output::save_png_with_dpi;

/// Placeholder substituted with the identifier in the URL template.
pub const URL_SLOT: &str = "{hub}";

/// Prefix for encoded code files; the composer locates codes by this name.
pub const CODE_PREFIX: &str = "hub_";

/// File name of the encoded code for an identifier.
pub fn code_filename(id: &Identifier) -> String {
    format!("{CODE_PREFIX}{id}.png")
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("url template must contain exactly one '{URL_SLOT}' placeholder: '{0}'")]
    BadTemplate(String),
    #[error("emblem scale must be within (0, 1], got {0}")]
    BadEmblemScale(f32),
    #[error("url for identifier {id} does not fit any symbol at the requested correction level")]
    Capacity {
        id: String,
        #[source]
        source: QrError,
    },
}

impl From<Correction> for EcLevel {
    fn from(value: Correction) -> EcLevel {
        match value {
            Correction::Low => EcLevel::L,
            Correction::Medium => EcLevel::M,
            Correction::Quartile => EcLevel::Q,
            Correction::High => EcLevel::H,
        }
    }
}

/// Whether and how the emblem was applied to one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmblemStatus {
    /// No emblem configured; no sourcing attempted.
    NotConfigured,
    Applied,
    /// Configured but absent on disk; the code was produced without it.
    Missing(PathBuf),
}

/// Result of encoding one identifier.
#[derive(Debug)]
pub struct EncodeOutcome {
    pub path: PathBuf,
    pub version: Version,
    pub emblem: EmblemStatus,
}

/// Encodes identifiers into QR images under the codes directory.
pub struct CodeEncoder {
    config: EncoderConfig,
    out_dir: PathBuf,
}

impl CodeEncoder {
    /// Build an encoder, validating the URL template up front.
    pub fn new(config: &PipelineConfig) -> Result<Self, EncodeError> {
        let encoder = config.encoder.clone();
        if encoder.url_template.matches(URL_SLOT).count() != 1 {
            return Err(EncodeError::BadTemplate(encoder.url_template));
        }
        if let Some(emblem) = &encoder.emblem {
            // The overlay must stay a proper fraction of the code edge.
            // NaN fails the comparison and is rejected with the rest.
            if !(emblem.scale > 0.0 && emblem.scale <= 1.0) {
                return Err(EncodeError::BadEmblemScale(emblem.scale));
            }
        }
        Ok(Self {
            config: encoder,
            out_dir: config.assets.codes_dir.clone(),
        })
    }

    /// URL encoded for an identifier.
    pub fn target_url(&self, id: &Identifier) -> String {
        self.config.url_template.replace(URL_SLOT, id.as_str())
    }

    /// Render the code raster without touching the filesystem.
    ///
    /// Returns the image and the auto-selected symbol version.
    pub fn render(&self, id: &Identifier) -> Result<(RgbaImage, Version), EncodeError> {
        let url = self.target_url(id);
        let code = QrCode::with_error_correction_level(url.as_bytes(), self.config.correction.into())
            .map_err(|source| EncodeError::Capacity {
                id: id.to_string(),
                source,
            })?;

        let modules = code.width() as u32;
        let px = self.config.module_size.max(1);
        let quiet = self.config.quiet_zone;
        let edge = (modules + 2 * quiet) * px;

        let background = rgba(self.config.background);
        let foreground = rgba(self.config.foreground);
        let mut image = RgbaImage::from_pixel(edge, edge, background);

        let colors = code.to_colors();
        for (index, module) in colors.iter().enumerate() {
            if *module == Color::Dark {
                let col = (index as u32) % modules;
                let row = (index as u32) / modules;
                let x = ((quiet + col) * px) as i32;
                let y = ((quiet + row) * px) as i32;
                draw_filled_rect_mut(&mut image, Rect::at(x, y).of_size(px, px), foreground);
            }
        }

        Ok((image, code.version()))
    }

    /// Encode one identifier and write its PNG, applying the emblem when
    /// configured and present.
    pub fn encode(&self, id: &Identifier) -> Result<EncodeOutcome> {
        let (mut image, version) = self.render(id)?;

        let emblem = match &self.config.emblem {
            None => EmblemStatus::NotConfigured,
            Some(emblem) => {
                if emblem.path.exists() {
                    apply_emblem(&mut image, emblem)?;
                    EmblemStatus::Applied
                } else {
                    EmblemStatus::Missing(emblem.path.clone())
                }
            }
        };

        let path = self.out_dir.join(code_filename(id));
        let rgb = image::DynamicImage::ImageRgba8(image).to_rgb8();
        save_png_with_dpi(&rgb, &path, self.config.dpi)?;

        Ok(EncodeOutcome {
            path,
            version,
            emblem,
        })
    }
}

/// Edge length of the emblem overlay for a given code edge.
fn emblem_edge(code_edge: u32, scale: f32) -> u32 {
    ((code_edge as f32) * scale).round() as u32
}

/// Composite the emblem onto the center of the code, respecting alpha.
fn apply_emblem(code: &mut RgbaImage, emblem: &EmblemConfig) -> Result<()> {
    let overlay = image::open(&emblem.path)
        .with_context(|| format!("failed to read emblem {}", emblem.path.display()))?
        .to_rgba8();

    let edge = code.width();
    let target = emblem_edge(edge, emblem.scale).max(1);
    let resized = imageops::resize(&overlay, target, target, FilterType::Lanczos3);

    let offset = ((edge - target) / 2) as i64;
    imageops::overlay(code, &resized, offset, offset);
    Ok(())
}

fn rgba(channels: [u8; 3]) -> Rgba<u8> {
    Rgba([channels[0], channels[1], channels[2], 0xff])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use image::Rgb;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn test_config(dir: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.assets.codes_dir = dir.join("codes");
        config.encoder.url_template = "https://x/hub/{hub}".into();
        config
    }

    #[test]
    fn rejects_templates_without_exactly_one_slot() {
        let mut config = PipelineConfig::default();
        config.encoder.url_template = "https://x/hub/".into();
        assert!(matches!(
            CodeEncoder::new(&config),
            Err(EncodeError::BadTemplate(_))
        ));

        config.encoder.url_template = "https://x/{hub}/{hub}".into();
        assert!(matches!(
            CodeEncoder::new(&config),
            Err(EncodeError::BadTemplate(_))
        ));
    }

    #[test]
    fn rejects_emblem_scale_outside_unit_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        let emblem_path = dir.path().join("emblem.png");
        RgbaImage::from_pixel(16, 16, Rgba([255, 0, 255, 255]))
            .save(&emblem_path)
            .unwrap();

        // A scale above 1.0 would make the overlay overrun the code
        // raster; construction must fail instead of encoding panicking.
        for scale in [1.5, 0.0, -0.3, f32::NAN] {
            config.encoder.emblem = Some(EmblemConfig {
                path: emblem_path.clone(),
                scale,
            });
            assert!(matches!(
                CodeEncoder::new(&config),
                Err(EncodeError::BadEmblemScale(_))
            ));
        }

        // The boundary value is still a legal cap.
        config.encoder.emblem = Some(EmblemConfig {
            path: emblem_path,
            scale: 1.0,
        });
        let encoder = CodeEncoder::new(&config).unwrap();
        let outcome = encoder.encode(&Identifier::new(8, 3)).unwrap();
        assert_eq!(outcome.emblem, EmblemStatus::Applied);
    }

    #[test]
    fn substitutes_identifier_into_template() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = CodeEncoder::new(&test_config(dir.path())).unwrap();
        let id = Identifier::new(7, 3);
        assert_eq!(encoder.target_url(&id), "https://x/hub/007");
    }

    #[test]
    fn raster_edge_includes_quiet_zone() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let encoder = CodeEncoder::new(&config).unwrap();
        let (image, version) = encoder.render(&Identifier::new(7, 3)).unwrap();

        let modules = match version {
            Version::Normal(v) => 17 + 4 * v as u32,
            Version::Micro(v) => 9 + 2 * v as u32,
        };
        let expected =
            (modules + 2 * config.encoder.quiet_zone) * config.encoder.module_size;
        assert_eq!(image.dimensions(), (expected, expected));
    }

    #[test]
    fn quiet_zone_is_background_colored() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let encoder = CodeEncoder::new(&config).unwrap();
        let (image, _) = encoder.render(&Identifier::new(1, 3)).unwrap();
        let bg = rgba(config.encoder.background);
        // Corners sit fully inside the quiet zone.
        assert_eq!(image.get_pixel(0, 0), &bg);
        let edge = image.width() - 1;
        assert_eq!(image.get_pixel(edge, edge), &bg);
        // A finder pattern corner module is foreground.
        let qz = config.encoder.quiet_zone * config.encoder.module_size;
        assert_eq!(image.get_pixel(qz, qz), &rgba(config.encoder.foreground));
    }

    #[test]
    fn selected_version_is_minimal_for_the_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let encoder = CodeEncoder::new(&config).unwrap();
        let id = Identifier::new(7, 3);
        let (_, version) = encoder.render(&id).unwrap();

        if let Version::Normal(v) = version {
            if v > 1 {
                let url = encoder.target_url(&id);
                let smaller = QrCode::with_version(
                    url.as_bytes(),
                    Version::Normal(v - 1),
                    config.encoder.correction.into(),
                );
                assert!(smaller.is_err(), "a smaller symbol should not fit");
            }
        }
    }

    #[test]
    fn encode_writes_deterministically_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let encoder = CodeEncoder::new(&config).unwrap();
        let outcome = encoder.encode(&Identifier::new(7, 3)).unwrap();
        assert_eq!(outcome.path, config.assets.codes_dir.join("hub_007.png"));
        assert!(outcome.path.exists());
        assert_eq!(outcome.emblem, EmblemStatus::NotConfigured);
    }

    #[test]
    fn missing_emblem_degrades_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        let absent = dir.path().join("absent.png");
        config.encoder.emblem = Some(EmblemConfig {
            path: absent.clone(),
            scale: 0.22,
        });
        let encoder = CodeEncoder::new(&config).unwrap();
        let outcome = encoder.encode(&Identifier::new(1, 3)).unwrap();
        assert!(outcome.path.exists());
        assert_eq!(outcome.emblem, EmblemStatus::Missing(absent));
    }

    #[test]
    fn emblem_is_centered_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        let emblem_path = dir.path().join("emblem.png");
        // Solid opaque magenta square, easy to spot after compositing.
        let emblem = RgbaImage::from_pixel(64, 64, Rgba([255, 0, 255, 255]));
        emblem.save(&emblem_path).unwrap();
        config.encoder.emblem = Some(EmblemConfig {
            path: emblem_path,
            scale: 0.22,
        });

        let encoder = CodeEncoder::new(&config).unwrap();
        let outcome = encoder.encode(&Identifier::new(2, 3)).unwrap();
        assert_eq!(outcome.emblem, EmblemStatus::Applied);

        let written = image::open(&outcome.path).unwrap().to_rgb8();
        let edge = written.width();
        let cap = emblem_edge(edge, 0.22);
        assert!(cap <= (edge as f32 * 0.22).ceil() as u32);
        // Center pixel is emblem-colored.
        assert_eq!(
            written.get_pixel(edge / 2, edge / 2),
            &Rgb([255, 0, 255])
        );
        // A pixel just outside the capped emblem square is not.
        let outside = edge / 2 + cap / 2 + 2;
        assert_ne!(written.get_pixel(outside, edge / 2), &Rgb([255, 0, 255]));
    }

    #[test]
    fn transparent_emblem_pixels_leave_the_code_visible() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        let emblem_path = dir.path().join("emblem.png");
        // Fully transparent overlay must change nothing.
        let emblem = RgbaImage::from_pixel(32, 32, Rgba([255, 0, 255, 0]));
        emblem.save(&emblem_path).unwrap();
        config.encoder.emblem = Some(EmblemConfig {
            path: emblem_path,
            scale: 0.22,
        });

        let encoder = CodeEncoder::new(&config).unwrap();
        let id = Identifier::new(3, 3);
        let (plain, _) = encoder.render(&id).unwrap();
        let outcome = encoder.encode(&id).unwrap();
        let written = image::open(&outcome.path).unwrap().to_rgb8();
        let plain_rgb = image::DynamicImage::ImageRgba8(plain).to_rgb8();
        assert_eq!(written.as_raw(), plain_rgb.as_raw());
    }
}
