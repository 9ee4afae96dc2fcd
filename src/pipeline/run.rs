//! Transposition pipeline orchestration
//!
//! A run is a straight line through the stages
//! `Idle → Extracting → Estimating → Resolving → Shifting → Done`,
//! leaving early with a [`PipelineError`] that names the failing stage.
//! When the original key is supplied by the caller, extraction and
//! estimation are skipped. There are no retries.

use super::config::TransposeConfig;
use crate::analysis::{ChromaExtractor, ChromaVector, KeyEstimate, KeyEstimator, KeyTemplates};
use crate::audio::decode_file;
use crate::error::KeyShiftError;
use crate::interval::semitone_offset;
use crate::model::{KeyLabel, Note};
use crate::shift::PitchShifter;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Extracting,
    Estimating,
    Resolving,
    Shifting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Extracting => "extracting",
            Stage::Estimating => "estimating",
            Stage::Resolving => "resolving",
            Stage::Shifting => "shifting",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a run, carrying the stage it happened in
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: KeyShiftError,
}

impl PipelineError {
    fn at(stage: Stage) -> impl FnOnce(KeyShiftError) -> Self {
        move |source| Self { stage, source }
    }
}

/// Everything a run produces for presentation
#[derive(Debug, Clone, Serialize)]
pub struct TransposeReport {
    /// Detected key; `None` when the caller supplied the original key
    pub estimate: Option<KeyEstimate>,

    /// Key the shift was computed from (detected or overridden)
    pub original: KeyLabel,

    /// Requested root, if a transposition was requested
    pub target: Option<Note>,

    /// Signed semitone offset applied
    pub semitones: Option<i32>,

    /// Path of the transposed file
    pub output: Option<PathBuf>,
}

/// Runs key detection and transposition for one input file
pub struct TransposePipeline {
    config: TransposeConfig,
    extractor: ChromaExtractor,
    estimator: KeyEstimator,
    shifter: PitchShifter,
}

impl TransposePipeline {
    /// Create a pipeline using the Krumhansl-Schmuckler templates
    pub fn new(config: TransposeConfig) -> Result<Self, KeyShiftError> {
        Self::with_templates(config, KeyTemplates::default())
    }

    /// Create a pipeline with substitute key templates
    pub fn with_templates(
        config: TransposeConfig,
        templates: KeyTemplates,
    ) -> Result<Self, KeyShiftError> {
        let extractor = ChromaExtractor::new(config.chroma.clone())?;
        let shifter = PitchShifter::new(config.shift.clone())?;
        Ok(Self {
            config,
            extractor,
            estimator: KeyEstimator::new(templates),
            shifter,
        })
    }

    pub fn config(&self) -> &TransposeConfig {
        &self.config
    }

    /// Run the pipeline to completion or to the first error
    pub fn run(&self) -> Result<TransposeReport, PipelineError> {
        log::info!("Starting key shift for {:?}", self.config.input);
        let mut stage = Stage::Idle;

        let (estimate, original, mut waveform) = match &self.config.original {
            Some(original) => {
                stage = self.advance(stage, Stage::Resolving);
                let key = self
                    .parse_original(original)
                    .map_err(PipelineError::at(stage))?;
                log::info!("Using supplied original key: {}", key);
                (None, key, None)
            }
            None => {
                stage = self.advance(stage, Stage::Extracting);
                let waveform = decode_file(&self.config.input).map_err(PipelineError::at(stage))?;
                let chroma = self
                    .extractor
                    .extract(&waveform)
                    .map_err(PipelineError::at(stage))?;

                stage = self.advance(stage, Stage::Estimating);
                let estimate = if self.config.search_both_modes {
                    self.estimator.estimate_any_mode(&chroma)
                } else {
                    self.estimator.estimate(&chroma, self.config.mode)
                }
                .map_err(PipelineError::at(stage))?;
                log::info!(
                    "Detected key: {} (correlation {:.3})",
                    estimate.key,
                    estimate.correlation
                );
                self.log_runners_up(&chroma, &estimate);
                (Some(estimate), estimate.key, Some(waveform))
            }
        };

        let Some(target) = self.config.target else {
            self.advance(stage, Stage::Done);
            return Ok(TransposeReport {
                estimate,
                original,
                target: None,
                semitones: None,
                output: None,
            });
        };

        if stage != Stage::Resolving {
            stage = self.advance(stage, Stage::Resolving);
        }
        let semitones = semitone_offset(original.root, target);
        log::info!(
            "Shifting by {:+} semitones to reach {}",
            semitones,
            target
        );

        stage = self.advance(stage, Stage::Shifting);
        let source = match waveform.take() {
            Some(w) => w,
            None => decode_file(&self.config.input).map_err(PipelineError::at(stage))?,
        };
        self.shifter
            .shift_to_file(&source, semitones, &self.config.output)
            .map_err(PipelineError::at(stage))?;

        self.advance(stage, Stage::Done);
        Ok(TransposeReport {
            estimate,
            original,
            target: Some(target),
            semitones: Some(semitones),
            output: Some(self.config.output.clone()),
        })
    }

    /// A bare note takes the configured mode; a full label keeps its own
    fn parse_original(&self, original: &str) -> Result<KeyLabel, KeyShiftError> {
        KeyLabel::parse_or_note(original, self.config.mode)
    }

    /// Next-best roots in the detected mode, for judging how close the call was
    fn log_runners_up(&self, chroma: &ChromaVector, estimate: &KeyEstimate) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        if let Ok(ranked) = self.estimator.ranked(chroma, estimate.key.mode) {
            for candidate in ranked.iter().filter(|c| c.key != estimate.key).take(2) {
                log::debug!(
                    "  runner-up: {} (correlation {:.3})",
                    candidate.key,
                    candidate.correlation
                );
            }
        }
    }

    fn advance(&self, from: Stage, to: Stage) -> Stage {
        log::debug!("Pipeline stage: {} -> {}", from, to);
        to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;
    use tempfile::TempDir;

    #[test]
    fn test_missing_input_fails_while_extracting() {
        let dir = TempDir::new().unwrap();
        let config = TransposeConfig::new(dir.path().join("missing.wav"), dir.path().join("out.wav"))
            .with_target(Note::D);
        let err = TransposePipeline::new(config).unwrap().run().unwrap_err();
        assert_eq!(err.stage, Stage::Extracting);
        assert!(matches!(err.source, KeyShiftError::Io { .. }));
    }

    #[test]
    fn test_bad_override_fails_while_resolving() {
        let dir = TempDir::new().unwrap();
        let config = TransposeConfig::new(dir.path().join("missing.wav"), dir.path().join("out.wav"))
            .with_target(Note::D)
            .with_original_key("Db");
        let err = TransposePipeline::new(config).unwrap().run().unwrap_err();
        assert_eq!(err.stage, Stage::Resolving);
        assert!(matches!(err.source, KeyShiftError::InvalidNote(_)));
    }

    #[test]
    fn test_override_skips_detection_and_fails_while_shifting() {
        let dir = TempDir::new().unwrap();
        let config = TransposeConfig::new(dir.path().join("missing.wav"), dir.path().join("out.wav"))
            .with_target(Note::D)
            .with_original_key("C");
        let err = TransposePipeline::new(config).unwrap().run().unwrap_err();
        assert_eq!(err.stage, Stage::Shifting);
    }

    #[test]
    fn test_parse_original_uses_configured_mode() {
        let config = TransposeConfig::new(PathBuf::from("in.wav"), PathBuf::from("out.wav"))
            .with_mode(Mode::Minor);
        let pipeline = TransposePipeline::new(config).unwrap();
        assert_eq!(
            pipeline.parse_original("F#").unwrap(),
            KeyLabel::new(Note::FSharp, Mode::Minor)
        );
        assert_eq!(
            pipeline.parse_original("F# major").unwrap(),
            KeyLabel::new(Note::FSharp, Mode::Major)
        );
        assert!(matches!(
            pipeline.parse_original("E dorian"),
            Err(KeyShiftError::InvalidMode(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = TransposeConfig::new(PathBuf::from("in.wav"), PathBuf::from("out.wav"))
            .with_shift(crate::shift::ShiftConfig::new(0));
        assert!(matches!(
            TransposePipeline::new(config),
            Err(KeyShiftError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Estimating.to_string(), "estimating");
        let err = PipelineError {
            stage: Stage::Shifting,
            source: KeyShiftError::InvalidNote("H".to_string()),
        };
        assert!(err.to_string().starts_with("shifting stage failed"));
    }
}
