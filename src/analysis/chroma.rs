//! Chroma vector extraction
//!
//! Converts a waveform into a single 12-element pitch-class profile:
//! STFT power spectrum → chroma filterbank → per-frame max normalization →
//! average over time → unit Euclidean norm.

use crate::dsp::Stft;
use crate::error::{KeyShiftError, Result};
use crate::model::{Note, Waveform};
use serde::{Deserialize, Serialize};

const NUM_PITCH_CLASSES: usize = 12;

/// Reference frequency for octave weighting (A0)
const A0_HZ: f32 = 27.5;

/// Frames whose chroma peak is below this stay all-zero
const FRAME_FLOOR: f32 = 1e-10;

/// Mean chroma norm below which the signal counts as silent
const DEGENERATE_NORM: f32 = 1e-8;

/// Chroma extraction parameters
#[derive(Debug, Clone)]
pub struct ChromaConfig {
    /// FFT frame size (default: 2048)
    pub frame_size: usize,

    /// Hop between frames (default: 512)
    pub hop_size: usize,

    /// Frequency of A4 in Hz (default: 440.0)
    pub tuning_hz: f32,

    /// Bins below this frequency are ignored (default: 27.5 Hz, A0)
    pub min_frequency: f32,

    /// Spread each bin over neighbouring pitch classes (default: true)
    pub soft_mapping: bool,

    /// Standard deviation of the soft mapping in semitones (default: 0.5)
    pub soft_mapping_sigma: f32,

    /// Centre of the Gaussian octave weighting, in octaves above A0
    /// (default: Some(5.0)); `None` weights all octaves equally
    pub octave_center: Option<f32>,

    /// Width of the octave weighting in octaves (default: 2.0)
    pub octave_width: f32,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            tuning_hz: 440.0,
            min_frequency: A0_HZ,
            soft_mapping: true,
            soft_mapping_sigma: 0.5,
            octave_center: Some(5.0),
            octave_width: 2.0,
        }
    }
}

impl ChromaConfig {
    pub fn with_frame_size(mut self, frame_size: usize, hop_size: usize) -> Self {
        self.frame_size = frame_size;
        self.hop_size = hop_size;
        self
    }

    pub fn with_tuning(mut self, tuning_hz: f32) -> Self {
        self.tuning_hz = tuning_hz;
        self
    }

    /// Map each bin to its nearest pitch class only
    pub fn with_hard_mapping(mut self) -> Self {
        self.soft_mapping = false;
        self
    }

    pub fn without_octave_weighting(mut self) -> Self {
        self.octave_center = None;
        self
    }
}

/// Unit-norm, time-averaged pitch-class energy profile (C ... B)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChromaVector([f32; NUM_PITCH_CLASSES]);

impl ChromaVector {
    /// Normalize raw pitch-class energies to unit Euclidean norm
    pub fn from_energies(energies: [f32; NUM_PITCH_CLASSES]) -> Result<Self> {
        if energies.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(KeyShiftError::DegenerateSignal(
                "chroma energies must be finite and non-negative".to_string(),
            ));
        }
        let norm = energies.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm < DEGENERATE_NORM {
            return Err(KeyShiftError::DegenerateSignal(
                "signal has no pitched energy (silent input)".to_string(),
            ));
        }
        let mut values = energies;
        for v in values.iter_mut() {
            *v /= norm;
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f32; NUM_PITCH_CLASSES] {
        &self.0
    }

    /// Energy of one pitch class
    pub fn get(&self, note: Note) -> f32 {
        self.0[note.index()]
    }

    /// Pitch class with the most energy (first in chromatic order on ties)
    pub fn dominant(&self) -> Note {
        let mut best = 0;
        for (i, &v) in self.0.iter().enumerate() {
            if v > self.0[best] {
                best = i;
            }
        }
        Note::from_index(best)
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

/// Computes [`ChromaVector`]s from waveforms
pub struct ChromaExtractor {
    config: ChromaConfig,
    stft: Stft,
}

impl ChromaExtractor {
    pub fn new(config: ChromaConfig) -> Result<Self> {
        if config.tuning_hz.is_nan() || config.tuning_hz <= 0.0 {
            return Err(KeyShiftError::InvalidConfig(format!(
                "tuning frequency must be positive, got {}",
                config.tuning_hz
            )));
        }
        if config.soft_mapping
            && (config.soft_mapping_sigma.is_nan() || config.soft_mapping_sigma <= 0.0)
        {
            return Err(KeyShiftError::InvalidConfig(format!(
                "soft mapping sigma must be positive, got {}",
                config.soft_mapping_sigma
            )));
        }
        if config.octave_center.is_some()
            && (config.octave_width.is_nan() || config.octave_width <= 0.0)
        {
            return Err(KeyShiftError::InvalidConfig(format!(
                "octave width must be positive, got {}",
                config.octave_width
            )));
        }
        let stft = Stft::new(config.frame_size, config.hop_size)?;
        Ok(Self { config, stft })
    }

    pub fn config(&self) -> &ChromaConfig {
        &self.config
    }

    /// Extract the time-averaged chroma profile of a waveform
    ///
    /// Fails with `DegenerateSignal` for empty or silent input.
    pub fn extract(&self, waveform: &Waveform) -> Result<ChromaVector> {
        log::debug!(
            "Extracting chroma: {} samples at {} Hz",
            waveform.len(),
            waveform.sample_rate()
        );

        if waveform.is_empty() {
            return Err(KeyShiftError::DegenerateSignal(
                "waveform has no samples".to_string(),
            ));
        }

        let filterbank = self.filterbank(waveform.sample_rate());
        let frames = self.stft.forward(waveform.samples());

        let mut mean = [0.0f32; NUM_PITCH_CLASSES];
        for spectrum in &frames {
            let mut chroma = [0.0f32; NUM_PITCH_CLASSES];
            for (bin, weights) in filterbank.iter() {
                let power = spectrum[*bin].norm_sqr();
                for (c, w) in chroma.iter_mut().zip(weights.iter()) {
                    *c += power * w;
                }
            }

            let peak = chroma.iter().copied().fold(0.0f32, f32::max);
            if peak < FRAME_FLOOR {
                continue;
            }
            for (m, c) in mean.iter_mut().zip(chroma.iter()) {
                *m += c / peak;
            }
        }

        for m in mean.iter_mut() {
            *m /= frames.len() as f32;
        }

        let chroma = ChromaVector::from_energies(mean)?;
        log::debug!(
            "Chroma over {} frames, dominant pitch class {}",
            frames.len(),
            chroma.dominant()
        );
        Ok(chroma)
    }

    /// Per-bin pitch-class weights for the bins that contribute
    fn filterbank(&self, sample_rate: u32) -> Vec<(usize, [f32; NUM_PITCH_CLASSES])> {
        let bin_hz = sample_rate as f32 / self.config.frame_size as f32;

        (1..self.stft.num_bins())
            .filter_map(|bin| {
                let freq = bin as f32 * bin_hz;
                if freq < self.config.min_frequency {
                    return None;
                }
                let weights = self.bin_weights(freq);
                Some((bin, weights))
            })
            .collect()
    }

    fn bin_weights(&self, freq: f32) -> [f32; NUM_PITCH_CLASSES] {
        // Fractional pitch class with C = 0 (A = 9).
        let semitones_from_a = 12.0 * (freq / self.config.tuning_hz).log2();
        let pitch_class = (semitones_from_a + 9.0).rem_euclid(12.0);

        let mut weights = [0.0f32; NUM_PITCH_CLASSES];
        if self.config.soft_mapping {
            let sigma = self.config.soft_mapping_sigma;
            for (pc, w) in weights.iter_mut().enumerate() {
                let raw = (pitch_class - pc as f32).abs();
                let distance = raw.min(12.0 - raw);
                *w = (-0.5 * (distance / sigma).powi(2)).exp();
            }
            let total: f32 = weights.iter().sum();
            for w in weights.iter_mut() {
                *w /= total;
            }
        } else {
            let nearest = pitch_class.round() as usize % NUM_PITCH_CLASSES;
            weights[nearest] = 1.0;
        }

        if let Some(center) = self.config.octave_center {
            let octave = (freq / A0_HZ).log2();
            let scale = (-0.5 * ((octave - center) / self.config.octave_width).powi(2)).exp();
            for w in weights.iter_mut() {
                *w *= scale;
            }
        }

        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f32::consts::PI;

    fn tone(frequencies: &[f32], sample_rate: u32, seconds: f32) -> Waveform {
        let total = (sample_rate as f32 * seconds) as usize;
        let n = frequencies.len() as f32;
        let samples = (0..total)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                frequencies
                    .iter()
                    .map(|f| (2.0 * PI * f * t).sin())
                    .sum::<f32>()
                    / n
            })
            .collect();
        Waveform::new(samples, sample_rate).unwrap()
    }

    fn extractor() -> ChromaExtractor {
        ChromaExtractor::new(ChromaConfig::default()).unwrap()
    }

    #[test]
    fn test_silent_waveform_is_degenerate() {
        let extractor = extractor();
        let silent = Waveform::new(vec![0.0; 44100], 44100).unwrap();
        let result = extractor.extract(&silent);
        assert!(matches!(result, Err(KeyShiftError::DegenerateSignal(_))));
    }

    #[test]
    fn test_empty_waveform_is_degenerate() {
        let extractor = extractor();
        let empty = Waveform::new(Vec::new(), 44100).unwrap();
        assert!(matches!(
            extractor.extract(&empty),
            Err(KeyShiftError::DegenerateSignal(_))
        ));
    }

    #[test]
    fn test_a440_maps_to_a() {
        let extractor = extractor();
        let chroma = extractor.extract(&tone(&[440.0], 22050, 1.0)).unwrap();
        assert_eq!(chroma.dominant(), Note::A);
    }

    #[test]
    fn test_middle_c_maps_to_c_with_hard_mapping() {
        let config = ChromaConfig::default().with_hard_mapping();
        let extractor = ChromaExtractor::new(config).unwrap();
        let chroma = extractor.extract(&tone(&[261.63], 22050, 1.0)).unwrap();
        assert_eq!(chroma.dominant(), Note::C);
    }

    #[test]
    fn test_chroma_has_unit_norm() {
        let extractor = extractor();
        for freqs in [&[440.0][..], &[261.63, 329.63, 392.0], &[110.0, 277.18]] {
            let chroma = extractor.extract(&tone(freqs, 22050, 0.5)).unwrap();
            assert_approx_eq!(chroma.norm(), 1.0, 1e-5);
            assert!(chroma.values().iter().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn test_tuning_shifts_pitch_class() {
        // With A4 tuned to 415 Hz, a 440 Hz tone sits a semitone above A.
        let config = ChromaConfig::default().with_tuning(415.3);
        let extractor = ChromaExtractor::new(config).unwrap();
        let chroma = extractor.extract(&tone(&[440.0], 22050, 1.0)).unwrap();
        assert_eq!(chroma.dominant(), Note::ASharp);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ChromaConfig::default().with_tuning(0.0);
        assert!(matches!(
            ChromaExtractor::new(config),
            Err(KeyShiftError::InvalidConfig(_))
        ));
        let config = ChromaConfig::default().with_frame_size(2048, 0);
        assert!(matches!(
            ChromaExtractor::new(config),
            Err(KeyShiftError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_energies_rejects_zero_vector() {
        assert!(matches!(
            ChromaVector::from_energies([0.0; 12]),
            Err(KeyShiftError::DegenerateSignal(_))
        ));
    }
}
