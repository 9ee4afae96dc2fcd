//! Audio file I/O
//!
//! Decoding goes through symphonia; output is always mono WAV via hound.

pub mod decoder;
pub mod writer;

pub use decoder::decode_file;
pub use writer::write_wav_atomic;
