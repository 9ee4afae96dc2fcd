//! Transposition run configuration

use crate::analysis::ChromaConfig;
use crate::model::{Mode, Note};
use crate::shift::ShiftConfig;
use std::path::PathBuf;

/// Configuration for one transposition run
#[derive(Debug, Clone)]
pub struct TransposeConfig {
    /// Decodable source audio file
    pub input: PathBuf,

    /// Destination WAV; replaced atomically if it exists
    pub output: PathBuf,

    /// Mode the recording is known to be in (default: Major)
    pub mode: Mode,

    /// Root note to transpose to; `None` runs key detection only
    pub target: Option<Note>,

    /// Caller-supplied original key, e.g. `"E"` or `"E major"`.
    /// When set, key detection is skipped entirely.
    pub original: Option<String>,

    /// Evaluate all 24 keys instead of only the declared mode
    pub search_both_modes: bool,

    /// Chroma extraction parameters
    pub chroma: ChromaConfig,

    /// Pitch shifter parameters
    pub shift: ShiftConfig,
}

impl TransposeConfig {
    /// Create a new run configuration
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            output,
            mode: Mode::Major,
            target: None,
            original: None,
            search_both_modes: false,
            chroma: ChromaConfig::default(),
            shift: ShiftConfig::default(),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_target(mut self, target: Note) -> Self {
        self.target = Some(target);
        self
    }

    /// Override the detected key
    pub fn with_original_key(mut self, original: impl Into<String>) -> Self {
        self.original = Some(original.into());
        self
    }

    pub fn with_both_modes(mut self, enable: bool) -> Self {
        self.search_both_modes = enable;
        self
    }

    pub fn with_chroma(mut self, chroma: ChromaConfig) -> Self {
        self.chroma = chroma;
        self
    }

    pub fn with_shift(mut self, shift: ShiftConfig) -> Self {
        self.shift = shift;
        self
    }
}
