//! Typeface loading and weight resolution.
//!
//! The card face uses one typeface at three visual weights. Variable fonts
//! expose a `wght` axis; the capability is queried explicitly and requested
//! weights are clamped into the declared range. A font without the axis
//! keeps its single static weight.

use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, VariableFont};
use anyhow::{Context, Result, anyhow};

/// Declared range of a font's weight axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightAxis {
    pub min: f32,
    pub default: f32,
    pub max: f32,
}

impl WeightAxis {
    /// Clamp a requested weight into the declared range.
    pub fn clamp(&self, weight: f32) -> f32 {
        weight.clamp(self.min, self.max)
    }
}

/// A typeface source that can mint faces at requested weights.
pub struct Typeface {
    bytes: Vec<u8>,
    axis: Option<WeightAxis>,
}

impl Typeface {
    /// Load and validate a typeface file. Unreadable or unparsable files
    /// are fatal for the whole run.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read typeface {}", path.display()))?;
        let probe = FontVec::try_from_vec(bytes.clone())
            .map_err(|_| anyhow!("typeface {} is not a valid font", path.display()))?;
        let axis = weight_axis(&probe);
        Ok(Self { bytes, axis })
    }

    /// The weight axis, when the font has one.
    pub fn weight_axis(&self) -> Option<WeightAxis> {
        self.axis
    }

    /// Produce a face at the requested weight, clamped to the axis range.
    /// Without an axis the request is ignored and the static weight is used.
    pub fn at_weight(&self, weight: f32) -> Result<FontVec> {
        let mut font = FontVec::try_from_vec(self.bytes.clone())
            .map_err(|_| anyhow!("typeface bytes no longer parse as a font"))?;
        if let Some(axis) = self.axis {
            font.set_variation(b"wght", axis.clamp(weight));
        }
        Ok(font)
    }
}

/// Query a font for its `wght` variation axis.
fn weight_axis(font: &FontVec) -> Option<WeightAxis> {
    font.variations()
        .into_iter()
        .find(|axis| axis.tag == *b"wght")
        .map(|axis| WeightAxis {
            min: axis.min_value,
            default: axis.default_value,
            max: axis.max_value,
        })
}
