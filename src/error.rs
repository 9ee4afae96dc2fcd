//! Error types for key detection and transposition

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the core components
///
/// Every component fails fast with one of these; nothing downstream
/// substitutes a default key, offset or waveform.
#[derive(Debug, Error)]
pub enum KeyShiftError {
    /// Zero-energy or zero-variance input defeats normalization or correlation
    #[error("degenerate signal: {0}")]
    DegenerateSignal(String),

    /// Note name outside the 12 sharp-spelled chromatic names
    #[error("invalid note name {0:?} (expected one of C, C#, D, D#, E, F, F#, G, G#, A, A#, B)")]
    InvalidNote(String),

    /// Mode name other than major/minor
    #[error("invalid mode {0:?} (expected major or minor)")]
    InvalidMode(String),

    /// Analysis or shift parameters that cannot produce a result
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input could not be decoded into a waveform
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Source unreadable or destination unwritable
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl KeyShiftError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KeyShiftError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, KeyShiftError>;
