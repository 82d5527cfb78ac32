//! Ошибки конвейера

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load data from {path}: {reason}")]
    DataLoad { path: PathBuf, reason: String },

    #[error("required column `{0}` is missing")]
    MissingColumn(String),

    #[error("cannot parse column `{column}` at row {row}: {value:?}")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("level {level:?} of `{column}` was not observed during fitting")]
    UnseenLevel { column: String, level: String },

    #[error("column `{column}` has no value at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("length mismatch: {observed} observed vs {predicted} predicted values")]
    LengthMismatch { observed: usize, predicted: usize },

    #[error("empty input")]
    EmptyInput,

    #[error("invalid formula {formula:?}: {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("model fitting failed: {0}")]
    Model(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Этап конвейера, на котором произошла ошибка
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Load,
    Clean,
    Split,
    Model,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Load => "load",
            Stage::Clean => "clean",
            Stage::Split => "split",
            Stage::Model => "model",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{stage} stage failed")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

pub trait StageContext<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError>;
}

impl<T> StageContext<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError> {
        self.map_err(|source| StageError { stage, source })
    }
}
