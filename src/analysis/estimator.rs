//! Key estimation by template correlation
//!
//! Correlates a chroma profile against the 12 rotations of one mode's
//! template and picks the best root. The caller supplies the mode; searching
//! both modes is available through [`KeyEstimator::estimate_any_mode`] but
//! is never the default, because relative major/minor pairs are too easily
//! confused.
//!
//! Ties are broken in chromatic order: the first root (from C upward) that
//! reaches the maximum correlation wins.

use super::chroma::ChromaVector;
use super::templates::KeyTemplates;
use crate::error::{KeyShiftError, Result};
use crate::model::{KeyLabel, Mode, Note};
use serde::{Deserialize, Serialize};

/// Below this the chroma is treated as flat (zero variance)
const MIN_VARIANCE: f64 = 1e-12;

/// Best-matching key and its Pearson correlation in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    pub key: KeyLabel,
    pub correlation: f32,
}

/// Template-matching key estimator
#[derive(Debug, Clone, Default)]
pub struct KeyEstimator {
    templates: KeyTemplates,
}

impl KeyEstimator {
    pub fn new(templates: KeyTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &KeyTemplates {
        &self.templates
    }

    /// Correlation of each root (C ... B) in the given mode
    pub fn scores(&self, chroma: &ChromaVector, mode: Mode) -> Result<[f32; 12]> {
        let values = chroma.values();
        if variance(values) < MIN_VARIANCE {
            return Err(KeyShiftError::DegenerateSignal(
                "chroma has zero variance; correlation is undefined".to_string(),
            ));
        }

        let mut scores = [0.0f32; 12];
        for (root, score) in scores.iter_mut().enumerate() {
            let candidate = self.templates.rotated(mode, root);
            *score = pearson(&candidate, values).ok_or_else(|| {
                KeyShiftError::DegenerateSignal(format!(
                    "{} template has zero variance; correlation is undefined",
                    mode
                ))
            })?;
        }
        Ok(scores)
    }

    /// Best root in the caller-declared mode
    pub fn estimate(&self, chroma: &ChromaVector, mode: Mode) -> Result<KeyEstimate> {
        let scores = self.scores(chroma, mode)?;

        let mut best = 0;
        for (root, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = root;
            }
        }

        let estimate = KeyEstimate {
            key: KeyLabel::new(Note::from_index(best), mode),
            correlation: scores[best],
        };
        log::debug!(
            "Best {} key: {} (correlation {:.3})",
            mode,
            estimate.key,
            estimate.correlation
        );
        Ok(estimate)
    }

    /// All 12 candidates of one mode, best first
    ///
    /// The sort is stable, so equal scores keep chromatic order and the
    /// first entry always equals [`KeyEstimator::estimate`].
    pub fn ranked(&self, chroma: &ChromaVector, mode: Mode) -> Result<Vec<KeyEstimate>> {
        let scores = self.scores(chroma, mode)?;
        let mut ranked: Vec<KeyEstimate> = scores
            .iter()
            .enumerate()
            .map(|(root, &correlation)| KeyEstimate {
                key: KeyLabel::new(Note::from_index(root), mode),
                correlation,
            })
            .collect();
        ranked.sort_by(|a, b| b.correlation.total_cmp(&a.correlation));
        Ok(ranked)
    }

    /// Search all 24 keys; major wins ties against minor
    pub fn estimate_any_mode(&self, chroma: &ChromaVector) -> Result<KeyEstimate> {
        let major = self.estimate(chroma, Mode::Major)?;
        let minor = self.estimate(chroma, Mode::Minor)?;
        Ok(if minor.correlation > major.correlation {
            minor
        } else {
            major
        })
    }
}

fn variance(values: &[f32; 12]) -> f64 {
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / 12.0;
    values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / 12.0
}

/// Pearson correlation; `None` if either side has zero variance
fn pearson(x: &[f32; 12], y: &[f32; 12]) -> Option<f32> {
    let mean_x = x.iter().map(|&v| v as f64).sum::<f64>() / 12.0;
    let mean_y = y.iter().map(|&v| v as f64).sum::<f64>() / 12.0;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a as f64 - mean_x;
        let dy = b as f64 - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < MIN_VARIANCE {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0) as f32)
}
