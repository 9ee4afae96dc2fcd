//! Run orchestration: decode, detect, resolve, shift, write

pub mod config;
pub mod run;

pub use config::TransposeConfig;
pub use run::{PipelineError, Stage, TransposePipeline, TransposeReport};
