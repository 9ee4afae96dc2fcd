//! Core data model
//!
//! Note names, modes and keys, plus the mono waveform passed between
//! pipeline stages.

mod key;
mod waveform;

pub use key::{KeyLabel, Mode, Note};
pub use waveform::Waveform;
