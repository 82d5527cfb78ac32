//! Конвейер: загрузка -> очистка -> признаки -> разбиение -> модели -> оценка

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::config::{ModelSpec, PipelineConfig};
use crate::error::{Result, Stage, StageContext, StageError};
use crate::models::{select_model, score, CandidateScore, Coefficient, Formula, OlsModel, Score};
use crate::preprocessing::cleaning::{clean, CleaningOptions};
use crate::preprocessing::feature_engineering::{derive_features, EnrichedTable, FeatureOptions};
use crate::preprocessing::loader::{load_csv, RawTable};
use crate::preprocessing::split::{select, stratified_split, Split, SplitOptions};
use crate::summary::{summarize, DatasetSummary};
use crate::types::EnrichedRecord;

#[derive(Debug, Clone, Serialize)]
pub struct SplitSizes {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub label: String,
    pub target: String,
    pub baseline: CandidateScore,
    pub augmented: CandidateScore,
    pub selected: String,
    pub validation_rmse: f64,
    pub refit_on_train_validation: bool,
    pub test: Score,
    pub coefficients: Vec<Coefficient>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub summary: DatasetSummary,
    pub split: SplitSizes,
    pub models: Vec<ModelReport>,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for model in &self.models {
            writeln!(f, "{} selected: {}", model.label, model.selected)?;
            writeln!(f, "{} validation RMSE: {:.4}", model.label, model.validation_rmse)?;
            writeln!(f, "{} test RMSE: {:.4}", model.label, model.test.rmse)?;
        }
        Ok(())
    }
}

/// Полный результат запуска: таблица нужна для выгрузки, разбиение для проверки
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: EnrichedTable,
    pub split: Split,
    pub report: PipelineReport,
}

pub fn run(input: &Path, config: &PipelineConfig) -> std::result::Result<PipelineOutput, StageError> {
    let raw = load_csv(input).at(Stage::Load)?;
    run_table(&raw, config)
}

pub fn run_table(
    raw: &RawTable,
    config: &PipelineConfig,
) -> std::result::Result<PipelineOutput, StageError> {
    config.validate().at(Stage::Config)?;

    let records = clean(
        raw,
        &CleaningOptions {
            strict_blood_pressure: config.strict_blood_pressure,
        },
    )
    .at(Stage::Clean)?;

    let run_date = config
        .run_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let table = derive_features(
        &records,
        &FeatureOptions {
            top_occupations: config.top_occupations,
            outlier_z_threshold: config.outlier_z_threshold,
            run_date,
            date_seed: config.date_seed,
        },
    );

    let split = stratified_split(
        &table.records,
        |r| r.record.sleep_disorder.to_string(),
        &SplitOptions {
            train_fraction: config.train_fraction,
            validation_share: config.validation_share,
            seed: config.seed,
            require_every_partition: config.require_every_partition,
        },
    )
    .at(Stage::Split)?;

    let models = vec![
        fit_and_evaluate("Sleep duration model", &config.duration_model, &table.records, &split, config)
            .at(Stage::Model)?,
        fit_and_evaluate("Sleep quality model", &config.quality_model, &table.records, &split, config)
            .at(Stage::Model)?,
    ];

    let report = PipelineReport {
        summary: summarize(&table),
        split: SplitSizes {
            train: split.train.len(),
            validation: split.validation.len(),
            test: split.test.len(),
        },
        models,
    };

    Ok(PipelineOutput { table, split, report })
}

fn fit_and_evaluate(
    label: &str,
    candidates: &ModelSpec,
    rows: &[EnrichedRecord],
    split: &Split,
    config: &PipelineConfig,
) -> Result<ModelReport> {
    let baseline = Formula::parse(&candidates.baseline)?;
    let augmented = Formula::parse(&candidates.augmented)?;

    let train = select(rows, &split.train);
    let validation = select(rows, &split.validation);
    let test = select(rows, &split.test);

    let selection = select_model(&train, &validation, &baseline, &augmented)?;

    let final_model = if config.refit_on_train_validation {
        OlsModel::fit(&select(rows, &split.train_validation()), &selection.chosen)?
    } else {
        selection.model.clone()
    };

    let test_score = score(&final_model, &test)?;
    tracing::info!("{}: {} -> test RMSE {:.4}", label, selection.chosen, test_score.rmse);

    Ok(ModelReport {
        label: label.to_string(),
        target: baseline.target.to_string(),
        validation_rmse: selection.chosen_score().rmse,
        selected: selection.chosen.to_string(),
        baseline: selection.baseline,
        augmented: selection.augmented,
        refit_on_train_validation: config.refit_on_train_validation,
        test: test_score,
        coefficients: final_model.coefficients(),
    })
}
