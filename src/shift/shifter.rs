//! Semitone pitch shifting
//!
//! The transform itself is `timestretch::pitch_shift`, which stretches and
//! resamples so that sample rate and duration never change; only pitch
//! content does.

use crate::audio::{decode_file, write_wav_atomic};
use crate::error::{KeyShiftError, Result};
use crate::model::Waveform;
use std::path::Path;
use timestretch::StretchParams;

/// Largest supported shift in either direction (four octaves)
pub const MAX_SEMITONES: i32 = 48;

/// Pitch shifter parameters
#[derive(Debug, Clone)]
pub struct ShiftConfig {
    /// Largest accepted shift in either direction (default: 48, four octaves)
    pub max_semitones: i32,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            max_semitones: MAX_SEMITONES,
        }
    }
}

impl ShiftConfig {
    pub fn new(max_semitones: i32) -> Self {
        Self { max_semitones }
    }
}

/// Transposes waveforms by whole semitones
pub struct PitchShifter {
    config: ShiftConfig,
}

impl PitchShifter {
    pub fn new(config: ShiftConfig) -> Result<Self> {
        if !(1..=MAX_SEMITONES).contains(&config.max_semitones) {
            return Err(KeyShiftError::InvalidConfig(format!(
                "max shift must be in 1..={}, got {}",
                MAX_SEMITONES, config.max_semitones
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ShiftConfig {
        &self.config
    }

    /// Shift a waveform by `semitones`; positive raises pitch
    ///
    /// Zero returns an identical copy without running the transform.
    pub fn shift(&self, waveform: &Waveform, semitones: i32) -> Result<Waveform> {
        let limit = self.config.max_semitones;
        if semitones.unsigned_abs() > limit.unsigned_abs() {
            return Err(KeyShiftError::InvalidConfig(format!(
                "shift of {} semitones exceeds the supported range of +/-{}",
                semitones, limit
            )));
        }
        if semitones == 0 {
            log::debug!("Zero-semitone shift, passing waveform through");
            return Ok(waveform.clone());
        }

        // timestretch stretches by 1/factor before resampling, so a factor
        // below 1 raises pitch.
        let factor = 2f64.powf(-(semitones as f64) / 12.0);
        log::debug!(
            "Shifting {} samples by {:+} semitones (timestretch factor {:.4})",
            waveform.len(),
            semitones,
            factor
        );

        let params = StretchParams::new(1.0)
            .with_sample_rate(waveform.sample_rate())
            .with_channels(1);
        let mut shifted = timestretch::pitch_shift(waveform.samples(), &params, factor)
            .map_err(|e| {
                // The range was checked above; what is left is input the
                // transform cannot process, e.g. shorter than one segment.
                KeyShiftError::UnsupportedFormat(format!(
                    "cannot shift {} samples by {:+} semitones: {}",
                    waveform.len(),
                    semitones,
                    e
                ))
            })?;
        shifted.resize(waveform.len(), 0.0);

        Waveform::new(shifted, waveform.sample_rate())
    }

    /// Shift a waveform and atomically replace `output` with the result
    pub fn shift_to_file(
        &self,
        waveform: &Waveform,
        semitones: i32,
        output: &Path,
    ) -> Result<Waveform> {
        let shifted = self.shift(waveform, semitones)?;
        write_wav_atomic(&shifted, output)?;
        log::info!(
            "Wrote {:.1}s shifted {:+} semitones to {:?}",
            shifted.duration_secs(),
            semitones,
            output
        );
        Ok(shifted)
    }

    /// Decode `input`, shift it and atomically replace `output` with the result
    pub fn shift_file(&self, input: &Path, semitones: i32, output: &Path) -> Result<Waveform> {
        let waveform = decode_file(input)?;
        self.shift_to_file(&waveform, semitones, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ChromaConfig, ChromaExtractor};
    use crate::model::Note;
    use std::f32::consts::PI;
    use tempfile::TempDir;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Waveform {
        let len = (sample_rate as f32 * seconds) as usize;
        let samples = (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect();
        Waveform::new(samples, sample_rate).unwrap()
    }

    fn shifter() -> PitchShifter {
        PitchShifter::new(ShiftConfig::default()).unwrap()
    }

    #[test]
    fn test_zero_shift_is_identity() {
        let wave = sine(440.0, 22050, 0.5);
        let shifted = shifter().shift(&wave, 0).unwrap();
        assert_eq!(shifted, wave);
    }

    #[test]
    fn test_nonzero_shift_preserves_rate_and_length() {
        let wave = sine(440.0, 22050, 0.75);
        for steps in [-7, -1, 1, 5, 12] {
            let shifted = shifter().shift(&wave, steps).unwrap();
            assert_eq!(shifted.len(), wave.len());
            assert_eq!(shifted.sample_rate(), wave.sample_rate());
        }
    }

    #[test]
    fn test_shift_moves_pitch_class() {
        let extractor = ChromaExtractor::new(ChromaConfig::default()).unwrap();
        let wave = sine(440.0, 22050, 1.0);

        let up = shifter().shift(&wave, 3).unwrap();
        assert_eq!(extractor.extract(&up).unwrap().dominant(), Note::C);

        let down = shifter().shift(&wave, -2).unwrap();
        assert_eq!(extractor.extract(&down).unwrap().dominant(), Note::G);
    }

    /// Strongest frequency of a waveform, in Hz, from a single long FFT
    fn peak_hz(wave: &Waveform) -> f32 {
        use rustfft::num_complex::Complex;
        use rustfft::FftPlanner;

        let n = 16384.min(wave.len());
        let start = (wave.len() - n) / 2;
        let mut buffer: Vec<Complex<f32>> = wave.samples()[start..start + n]
            .iter()
            .map(|&s| Complex::new(s, 0.0))
            .collect();
        FftPlanner::<f32>::new()
            .plan_fft_forward(n)
            .process(&mut buffer);

        let (bin, _) = buffer[1..n / 2]
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, c)| {
                if c.norm() > best.1 {
                    (i + 1, c.norm())
                } else {
                    best
                }
            });
        bin as f32 * wave.sample_rate() as f32 / n as f32
    }

    #[test]
    fn test_positive_shift_raises_pitch() {
        let wave = sine(440.0, 22050, 1.0);
        for (steps, expected) in [(1, 466.16), (12, 880.0), (-12, 220.0), (-5, 329.63)] {
            let shifted = shifter().shift(&wave, steps).unwrap();
            let peak = peak_hz(&shifted);
            // Within about a quarter tone of the target.
            assert!(
                (peak / expected - 1.0).abs() < 0.03,
                "{:+} semitones: peak at {} Hz, expected {} Hz",
                steps,
                peak,
                expected
            );
        }
    }

    #[test]
    fn test_too_short_input_is_unsupported() {
        let wave = Waveform::new(vec![0.25], 22050).unwrap();
        assert!(matches!(
            shifter().shift(&wave, 1),
            Err(KeyShiftError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_rejects_absurd_shift() {
        let wave = sine(440.0, 8000, 0.1);
        assert!(matches!(
            shifter().shift(&wave, 200),
            Err(KeyShiftError::InvalidConfig(_))
        ));
        assert!(matches!(
            shifter().shift(&wave, i32::MIN),
            Err(KeyShiftError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_configured_limit_is_enforced() {
        let narrow = PitchShifter::new(ShiftConfig::new(12)).unwrap();
        let wave = sine(440.0, 8000, 0.5);
        assert!(narrow.shift(&wave, 12).is_ok());
        assert!(matches!(
            narrow.shift(&wave, -13),
            Err(KeyShiftError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_bad_limit() {
        for limit in [0, -3, MAX_SEMITONES + 1] {
            assert!(matches!(
                PitchShifter::new(ShiftConfig::new(limit)),
                Err(KeyShiftError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_shift_file_writes_wav() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        write_wav_atomic(&sine(330.0, 16000, 0.5), &input).unwrap();

        let shifted = shifter().shift_file(&input, 2, &output).unwrap();

        let reread = decode_file(&output).unwrap();
        assert_eq!(reread.sample_rate(), 16000);
        assert_eq!(reread.len(), shifted.len());
        assert_eq!(reread.len(), 8000);
    }

    #[test]
    fn test_shift_file_rejects_undecodable_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp3");
        let output = dir.path().join("out.wav");
        std::fs::write(&input, b"not audio at all").unwrap();

        let result = shifter().shift_file(&input, 1, &output);
        assert!(matches!(result, Err(KeyShiftError::UnsupportedFormat(_))));
        assert!(!output.exists());
    }
}
