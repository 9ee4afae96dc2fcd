//! keyshift - musical key detection and transposition
//!
//! Estimates the key of a recording from its time-averaged chroma profile
//! and pitch-shifts the recording to a chosen target key.

pub mod analysis;
pub mod audio;
pub mod dsp;
pub mod error;
pub mod interval;
pub mod model;
pub mod pipeline;
pub mod shift;

pub use error::{KeyShiftError, Result};
pub use interval::{resolve_offset, semitone_offset};
pub use model::{KeyLabel, Mode, Note, Waveform};
pub use pipeline::{TransposeConfig, TransposePipeline, TransposeReport};
