//! Pitch shifting and persistence of the transposed waveform

mod shifter;

pub use shifter::{PitchShifter, ShiftConfig, MAX_SEMITONES};
