//! Key analysis
//!
//! Chroma extraction followed by Krumhansl-Schmuckler template matching.
//! Both stages are pure functions of their inputs.

pub mod chroma;
pub mod estimator;
pub mod templates;

pub use chroma::{ChromaConfig, ChromaExtractor, ChromaVector};
pub use estimator::{KeyEstimate, KeyEstimator};
pub use templates::KeyTemplates;
