//! Sleep ML - анализ опроса о сне и образе жизни

pub mod config;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod summary;
pub mod types;

#[cfg(test)]
mod testing;

pub use types::*;
pub use models::*;
pub use preprocessing::*;

// Re-export для удобства
pub use config::PipelineConfig;
pub use error::{PipelineError, Result, Stage, StageError};
pub use evaluation::rmse;
pub use pipeline::{run, run_table, PipelineOutput, PipelineReport};
