use crate::error::KeyShiftError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the 12 chromatic roots, sharp spelling only
///
/// Declaration order is the chromatic order starting at C, and
/// [`Note::index`] is the position used for all interval arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl Note {
    /// All roots in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::CSharp,
        Note::D,
        Note::DSharp,
        Note::E,
        Note::F,
        Note::FSharp,
        Note::G,
        Note::GSharp,
        Note::A,
        Note::ASharp,
        Note::B,
    ];

    /// Position in the chromatic sequence (C = 0 ... B = 11)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Root at a chromatic position, wrapping modulo 12
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Get the note name as written by users
    pub fn name(self) -> &'static str {
        match self {
            Note::C => "C",
            Note::CSharp => "C#",
            Note::D => "D",
            Note::DSharp => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::FSharp => "F#",
            Note::G => "G",
            Note::GSharp => "G#",
            Note::A => "A",
            Note::ASharp => "A#",
            Note::B => "B",
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Note {
    type Err = KeyShiftError;

    /// Parse a sharp-spelled note name. Flats are rejected, never respelled.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Note::ALL
            .iter()
            .copied()
            .find(|note| note.name() == trimmed)
            .ok_or_else(|| KeyShiftError::InvalidNote(s.to_string()))
    }
}

/// Tonal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = KeyShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "major" => Ok(Mode::Major),
            "minor" => Ok(Mode::Minor),
            _ => Err(KeyShiftError::InvalidMode(s.to_string())),
        }
    }
}

/// A musical key: root note plus mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyLabel {
    pub root: Note,
    pub mode: Mode,
}

impl KeyLabel {
    /// Parse a full `"<note> <mode>"` label, or a bare note in `default_mode`
    pub fn parse_or_note(s: &str, default_mode: Mode) -> Result<Self, KeyShiftError> {
        if s.split_whitespace().count() > 1 {
            s.parse()
        } else {
            Ok(Self::new(s.parse()?, default_mode))
        }
    }

    pub fn new(root: Note, mode: Mode) -> Self {
        Self { root, mode }
    }
}

impl fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.mode)
    }
}

impl FromStr for KeyLabel {
    type Err = KeyShiftError;

    /// Parse `"<note> <mode>"`, e.g. `"F# minor"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let root = parts
            .next()
            .ok_or_else(|| KeyShiftError::InvalidNote(s.to_string()))?
            .parse::<Note>()?;
        let mode = match (parts.next(), parts.next()) {
            (Some(mode), None) => mode.parse::<Mode>()?,
            _ => return Err(KeyShiftError::InvalidMode(s.to_string())),
        };
        Ok(Self { root, mode })
    }
}
