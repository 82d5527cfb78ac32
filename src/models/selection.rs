//! Выбор между базовой формулой и формулой с взаимодействием

use serde::Serialize;

use crate::error::Result;
use crate::evaluation::rmse;
use crate::models::formula::Formula;
use crate::models::regression::{FittedModel, OlsModel};
use crate::types::EnrichedRecord;

/// RMSE модели на подвыборке
#[derive(Debug, Clone, Serialize)]
pub struct Score {
    pub rmse: f64,
    /// Строк, по которым посчитана метрика
    pub n: usize,
    /// Строк, исключённых из-за неизвестных уровней или пропусков
    pub excluded: usize,
}

pub fn score(model: &FittedModel, rows: &[EnrichedRecord]) -> Result<Score> {
    let predictions = model.predict_defined(rows)?;

    let mut observed = Vec::with_capacity(predictions.rows.len());
    let mut predicted = Vec::with_capacity(predictions.rows.len());
    let mut excluded = predictions.excluded;
    for (&i, &p) in predictions.rows.iter().zip(&predictions.values) {
        match model.formula.target.value(&rows[i]) {
            Some(o) => {
                observed.push(o);
                predicted.push(p);
            }
            None => excluded += 1,
        }
    }

    Ok(Score {
        rmse: rmse(&observed, &predicted)?,
        n: observed.len(),
        excluded,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub formula: String,
    pub validation: Score,
}

#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub baseline: CandidateScore,
    pub augmented: CandidateScore,
    pub chosen: Formula,
    pub chose_augmented: bool,
    /// Выбранная модель, обученная на train
    pub model: FittedModel,
}

impl ModelSelection {
    pub fn chosen_score(&self) -> &Score {
        if self.chose_augmented {
            &self.augmented.validation
        } else {
            &self.baseline.validation
        }
    }
}

/// Обе формулы обучаются на train и сравниваются по RMSE на validation.
/// При равенстве остаётся базовая.
pub fn select_model(
    train: &[EnrichedRecord],
    validation: &[EnrichedRecord],
    baseline: &Formula,
    augmented: &Formula,
) -> Result<ModelSelection> {
    let baseline_model = OlsModel::fit(train, baseline)?;
    let augmented_model = OlsModel::fit(train, augmented)?;

    let baseline_score = score(&baseline_model, validation)?;
    let augmented_score = score(&augmented_model, validation)?;

    tracing::info!(
        "Validation RMSE: {} = {:.4}, {} = {:.4}",
        baseline,
        baseline_score.rmse,
        augmented,
        augmented_score.rmse
    );

    let chose_augmented = augmented_score.rmse < baseline_score.rmse;
    let (chosen, model) = if chose_augmented {
        (augmented.clone(), augmented_model)
    } else {
        (baseline.clone(), baseline_model)
    };

    Ok(ModelSelection {
        baseline: CandidateScore {
            formula: baseline.to_string(),
            validation: baseline_score,
        },
        augmented: CandidateScore {
            formula: augmented.to_string(),
            validation: augmented_score,
        },
        chosen,
        chose_augmented,
        model,
    })
}
