//! Krumhansl-Schmuckler key templates
//!
//! Tonal profiles for the tonic-rooted major and minor keys (index 0 = tonic).
//! Keys on other roots are obtained by rotating these profiles.

use crate::error::{KeyShiftError, Result};
use crate::model::Mode;

/// Krumhansl-Schmuckler probe-tone ratings, major mode
pub const KRUMHANSL_MAJOR: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Schmuckler probe-tone ratings, minor mode
pub const KRUMHANSL_MINOR: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Unit-normalized major and minor templates
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTemplates {
    major: [f32; 12],
    minor: [f32; 12],
}

impl KeyTemplates {
    /// Build templates from raw weights, normalizing each to unit norm
    pub fn new(major: [f32; 12], minor: [f32; 12]) -> Result<Self> {
        Ok(Self {
            major: unit_normalize(major, Mode::Major)?,
            minor: unit_normalize(minor, Mode::Minor)?,
        })
    }

    /// Krumhansl-Schmuckler profiles
    pub fn krumhansl() -> Self {
        Self {
            major: normalized(KRUMHANSL_MAJOR),
            minor: normalized(KRUMHANSL_MINOR),
        }
    }

    pub fn for_mode(&self, mode: Mode) -> &[f32; 12] {
        match mode {
            Mode::Major => &self.major,
            Mode::Minor => &self.minor,
        }
    }

    /// Template cyclically rotated so its tonic lands on `root`
    pub fn rotated(&self, mode: Mode, root: usize) -> [f32; 12] {
        let template = self.for_mode(mode);
        let mut out = [0.0f32; 12];
        for (j, slot) in out.iter_mut().enumerate() {
            *slot = template[(j + 12 - root % 12) % 12];
        }
        out
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::krumhansl()
    }
}

fn unit_normalize(weights: [f32; 12], mode: Mode) -> Result<[f32; 12]> {
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(KeyShiftError::DegenerateSignal(format!(
            "{} template contains non-finite weights",
            mode
        )));
    }
    let norm = weights.iter().map(|w| w * w).sum::<f32>().sqrt();
    if norm == 0.0 {
        return Err(KeyShiftError::DegenerateSignal(format!(
            "{} template has zero norm",
            mode
        )));
    }
    Ok(weights.map(|w| w / norm))
}

fn normalized(weights: [f32; 12]) -> [f32; 12] {
    let norm = weights.iter().map(|w| w * w).sum::<f32>().sqrt();
    weights.map(|w| w / norm)
}
