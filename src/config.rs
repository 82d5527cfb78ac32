//! Настройки конвейера

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::Formula;

/// Пара формул для выбора модели: базовая и с взаимодействием
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub baseline: String,
    pub augmented: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    /// Доля остатка после train, уходящая в validation
    #[serde(default = "default_validation_share")]
    pub validation_share: f64,
    #[serde(default = "default_true")]
    pub require_every_partition: bool,
    #[serde(default = "default_top_occupations")]
    pub top_occupations: usize,
    #[serde(default = "default_outlier_z_threshold")]
    pub outlier_z_threshold: f64,
    #[serde(default)]
    pub strict_blood_pressure: bool,
    /// Без seed дата генерируется непредсказуемо
    #[serde(default)]
    pub date_seed: Option<u64>,
    #[serde(default)]
    pub run_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub refit_on_train_validation: bool,
    #[serde(default = "default_duration_model")]
    pub duration_model: ModelSpec,
    #[serde(default = "default_quality_model")]
    pub quality_model: ModelSpec,
}

fn default_seed() -> u64 { 123 }
fn default_train_fraction() -> f64 { 0.7 }
fn default_validation_share() -> f64 { 0.5 }
fn default_true() -> bool { true }
fn default_top_occupations() -> usize { 5 }
fn default_outlier_z_threshold() -> f64 { 3.0 }

fn default_duration_model() -> ModelSpec {
    ModelSpec {
        baseline: "Sleep_Duration ~ Stress_Level + Physical_Activity_Level + BMI_Category + Age"
            .to_string(),
        augmented: "Sleep_Duration ~ Stress_Level * Physical_Activity_Level + BMI_Category + Age"
            .to_string(),
    }
}

fn default_quality_model() -> ModelSpec {
    ModelSpec {
        baseline: "Quality_of_Sleep ~ Age + Sleep_Duration + Heart_Rate + Blood_Pressure"
            .to_string(),
        augmented: "Quality_of_Sleep ~ Age * Sleep_Duration + Heart_Rate + Blood_Pressure"
            .to_string(),
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            train_fraction: default_train_fraction(),
            validation_share: default_validation_share(),
            require_every_partition: true,
            top_occupations: default_top_occupations(),
            outlier_z_threshold: default_outlier_z_threshold(),
            strict_blood_pressure: false,
            date_seed: None,
            run_date: None,
            refit_on_train_validation: true,
            duration_model: default_duration_model(),
            quality_model: default_quality_model(),
        }
    }
}

impl PipelineConfig {
    /// Чтение JSON-файла; отсутствующие поля берутся по умолчанию
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("train_fraction", self.train_fraction),
            ("validation_share", self.validation_share),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(PipelineError::Config(format!(
                    "{} must lie in (0, 1), got {}",
                    name, value
                )));
            }
        }

        if self.top_occupations == 0 {
            return Err(PipelineError::Config("top_occupations must be positive".to_string()));
        }

        if !(self.outlier_z_threshold > 0.0) {
            return Err(PipelineError::Config(format!(
                "outlier_z_threshold must be positive, got {}",
                self.outlier_z_threshold
            )));
        }

        for candidates in [&self.duration_model, &self.quality_model] {
            let baseline = Formula::parse(&candidates.baseline)
                .map_err(|e| PipelineError::Config(e.to_string()))?;
            let augmented = Formula::parse(&candidates.augmented)
                .map_err(|e| PipelineError::Config(e.to_string()))?;
            if baseline.target != augmented.target {
                return Err(PipelineError::Config(format!(
                    "candidate formulas predict different targets: {} vs {}",
                    baseline.target, augmented.target
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.seed, 123);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "seed": 7, "date_seed": 1, "run_date": "2024-01-31" }"#)
                .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.date_seed, Some(1));
        assert_eq!(config.run_date, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(config.train_fraction, 0.7);
        assert_eq!(config.top_occupations, 5);
        assert!(config.duration_model.augmented.contains('*'));
    }

    #[test]
    fn rejects_bad_fraction() {
        let config = PipelineConfig {
            train_fraction: 1.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn rejects_mismatched_targets() {
        let mut config = PipelineConfig::default();
        config.quality_model.baseline = "Sleep_Duration ~ Age".to_string();
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
