//! Semitone distance between keys
//!
//! Offsets are the raw difference of chromatic positions, with no wraparound:
//! moving from G to C is -7, not +5. Callers wanting the shorter direction
//! have to choose it themselves.

use crate::error::Result;
use crate::model::{KeyLabel, Mode, Note};

/// Signed semitones from `original` to `target`, in [-11, 11]
pub fn semitone_offset(original: Note, target: Note) -> i32 {
    target.index() as i32 - original.index() as i32
}

/// Parse both names and compute the offset
///
/// `original` may be a bare note (`"E"`) or a full key label (`"E major"`),
/// whose mode must be valid but does not affect the offset. `target` must be
/// a bare note name.
pub fn resolve_offset(original: &str, target: &str) -> Result<i32> {
    let root = KeyLabel::parse_or_note(original, Mode::Major)?.root;
    let target = target.parse::<Note>()?;

    let steps = semitone_offset(root, target);
    log::debug!("{} -> {}: {:+} semitones", root, target, steps);
    Ok(steps)
}
