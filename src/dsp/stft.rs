//! Short-time Fourier transform

use crate::error::{KeyShiftError, Result};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// One STFT frame: bins `0..=frame_size / 2`
pub type Spectrum = Vec<Complex<f32>>;

/// Periodic Hann window of length `size`
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / size as f32).cos())
        .collect()
}

/// Centered STFT with a Hann window
///
/// The signal is zero-padded by `frame_size / 2` on both sides so frame `t`
/// is centred on sample `t * hop_size`.
pub struct Stft {
    frame_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new(frame_size: usize, hop_size: usize) -> Result<Self> {
        if frame_size < 4 || frame_size % 2 != 0 {
            return Err(KeyShiftError::InvalidConfig(format!(
                "frame size must be an even number >= 4, got {}",
                frame_size
            )));
        }
        if hop_size == 0 || hop_size > frame_size {
            return Err(KeyShiftError::InvalidConfig(format!(
                "hop size must be in 1..={}, got {}",
                frame_size, hop_size
            )));
        }

        let mut planner = FftPlanner::<f32>::new();
        Ok(Self {
            frame_size,
            hop_size,
            window: hann_window(frame_size),
            forward: planner.plan_fft_forward(frame_size),
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of non-negative frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Forward transform, one spectrum per frame
    pub fn forward(&self, samples: &[f32]) -> Vec<Spectrum> {
        let pad = self.frame_size / 2;
        let num_frames = 1 + samples.len() / self.hop_size;
        let mut frames = Vec::with_capacity(num_frames);
        let mut buffer = vec![Complex::new(0.0, 0.0); self.frame_size];

        for t in 0..num_frames {
            let start = (t * self.hop_size) as isize - pad as isize;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let idx = start + i as isize;
                let sample = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(sample * self.window[i], 0.0);
            }
            self.forward.process(&mut buffer);
            frames.push(buffer[..self.num_bins()].to_vec());
        }

        frames
    }
}
