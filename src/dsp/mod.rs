//! Signal processing primitives for analysis

pub mod stft;

pub use stft::{hann_window, Spectrum, Stft};
