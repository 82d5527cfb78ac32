//! Линейная регрессия (МНК) по формуле

use std::collections::BTreeSet;

use linfa::traits::Fit;
use linfa::Dataset;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::models::formula::{CategoricalColumn, Formula, Term};
use crate::types::EnrichedRecord;

#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
}

/// Обученная модель: коэффициенты и уровни категорий, увиденные при обучении
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub formula: Formula,
    levels: Vec<(CategoricalColumn, Vec<String>)>,
    params: Array1<f64>,
    intercept: f64,
    n_obs: usize,
}

/// Предсказания только для строк, где модель определена
#[derive(Debug, Clone)]
pub struct Predictions {
    /// Индексы строк входного среза
    pub rows: Vec<usize>,
    pub values: Vec<f64>,
    pub excluded: usize,
}

pub struct OlsModel;

impl OlsModel {
    /// Обучение со свободным членом. Строки с пропусками отбрасываются.
    pub fn fit(rows: &[EnrichedRecord], formula: &Formula) -> Result<FittedModel> {
        let complete: Vec<&EnrichedRecord> = rows
            .iter()
            .filter(|r| formula.target.value(r).is_some() && is_complete(formula, r))
            .collect();

        let dropped = rows.len() - complete.len();
        if dropped > 0 {
            tracing::warn!("{}: dropped {} rows with missing values", formula, dropped);
        }

        // Уровни сортируются лексически, первый служит базовым
        let levels: Vec<(CategoricalColumn, Vec<String>)> = formula
            .terms
            .iter()
            .filter_map(|t| match t {
                Term::Categorical(c) => {
                    let observed: BTreeSet<String> =
                        complete.iter().filter_map(|r| c.level(r)).collect();
                    Some((*c, observed.into_iter().collect()))
                }
                _ => None,
            })
            .collect();

        let n_features: usize = formula
            .terms
            .iter()
            .map(|t| match t {
                Term::Categorical(c) => levels
                    .iter()
                    .find(|(col, _)| col == c)
                    .map(|(_, l)| l.len().saturating_sub(1))
                    .unwrap_or(0),
                _ => 1,
            })
            .sum();

        if n_features == 0 {
            return Err(PipelineError::Model(format!("{}: no predictor columns", formula)));
        }
        if complete.len() <= n_features + 1 {
            return Err(PipelineError::InsufficientData(format!(
                "{}: {} complete rows for {} parameters",
                formula,
                complete.len(),
                n_features + 1
            )));
        }

        let mut model = FittedModel {
            formula: formula.clone(),
            levels,
            params: Array1::zeros(n_features),
            intercept: 0.0,
            n_obs: complete.len(),
        };

        let mut x = Array2::zeros((complete.len(), n_features));
        let mut y = Array1::zeros(complete.len());
        for (i, row) in complete.iter().enumerate() {
            let features = model.encode(row, i)?;
            for (j, value) in features.into_iter().enumerate() {
                x[[i, j]] = value;
            }
            y[i] = formula.target.value(row).unwrap_or(f64::NAN);
        }

        if let Some(j) = aliased_column(&x) {
            return Err(PipelineError::Model(format!(
                "{}: term `{}` is linearly dependent on the intercept and earlier terms",
                formula,
                model.column_names()[j]
            )));
        }

        let dataset = Dataset::new(x, y);
        let fitted = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| PipelineError::Model(format!("{}: {}", formula, e)))?;

        model.params = fitted.params().clone();
        model.intercept = fitted.intercept();

        tracing::debug!("Fitted {} on {} rows", formula, model.n_obs);
        Ok(model)
    }
}

/// Колонка вырождена, если после ортогонализации от неё остаётся меньше этой доли нормы
const ALIAS_TOLERANCE: f64 = 1e-7;

/// Первая колонка, линейно зависимая от свободного члена и колонок левее.
/// Модифицированный Грам-Шмидт; константная колонка совпадает со свободным членом.
fn aliased_column(x: &Array2<f64>) -> Option<usize> {
    let n = x.nrows();
    let mut basis: Vec<Array1<f64>> = vec![Array1::from_elem(n, 1.0 / (n as f64).sqrt())];

    for (j, column) in x.columns().into_iter().enumerate() {
        let mut residual = column.to_owned();
        let norm = residual.dot(&residual).sqrt();
        for q in &basis {
            let projection = q.dot(&residual);
            residual.scaled_add(-projection, q);
        }

        let rest = residual.dot(&residual).sqrt();
        if rest <= ALIAS_TOLERANCE * norm {
            return Some(j);
        }
        basis.push(residual / rest);
    }

    None
}

fn is_complete(formula: &Formula, row: &EnrichedRecord) -> bool {
    formula.terms.iter().all(|t| match t {
        Term::Numeric(c) => c.value(row).is_some(),
        Term::Categorical(c) => c.level(row).is_some(),
        Term::Interaction(a, b) => a.value(row).is_some() && b.value(row).is_some(),
    })
}

impl FittedModel {
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Имена колонок матрицы признаков в стиле R: `BMI_CategoryObese`, `Age:Sleep_Duration`
    fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.params.len());
        for term in &self.formula.terms {
            match term {
                Term::Categorical(c) => {
                    for level in self.levels_of(*c).iter().skip(1) {
                        names.push(format!("{}{}", c, level));
                    }
                }
                other => names.push(other.to_string()),
            }
        }
        names
    }

    pub fn coefficients(&self) -> Vec<Coefficient> {
        std::iter::once(Coefficient {
            name: "(Intercept)".to_string(),
            estimate: self.intercept,
        })
        .chain(
            self.column_names()
                .into_iter()
                .zip(self.params.iter())
                .map(|(name, &estimate)| Coefficient { name, estimate }),
        )
        .collect()
    }

    fn levels_of(&self, column: CategoricalColumn) -> &[String] {
        self.levels
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, l)| l.as_slice())
            .unwrap_or(&[])
    }

    /// Строка признаков для одной записи; `row` нужен только для сообщений об ошибках
    fn encode(&self, record: &EnrichedRecord, row: usize) -> Result<Vec<f64>> {
        let missing = |column: &str| PipelineError::MissingValue {
            column: column.to_string(),
            row,
        };

        let mut features = Vec::with_capacity(self.params.len());
        for term in &self.formula.terms {
            match term {
                Term::Numeric(c) => features.push(c.value(record).ok_or_else(|| missing(c.name()))?),
                Term::Interaction(a, b) => {
                    let va = a.value(record).ok_or_else(|| missing(a.name()))?;
                    let vb = b.value(record).ok_or_else(|| missing(b.name()))?;
                    features.push(va * vb);
                }
                Term::Categorical(c) => {
                    let level = c.level(record).ok_or_else(|| missing(c.name()))?;
                    let levels = self.levels_of(*c);
                    let position = levels.iter().position(|l| *l == level).ok_or_else(|| {
                        PipelineError::UnseenLevel {
                            column: c.name().to_string(),
                            level: level.clone(),
                        }
                    })?;
                    for k in 1..levels.len() {
                        features.push(if k == position { 1.0 } else { 0.0 });
                    }
                }
            }
        }

        Ok(features)
    }

    fn predict_one(&self, record: &EnrichedRecord, row: usize) -> Result<f64> {
        let features = self.encode(record, row)?;
        Ok(self.intercept + Array1::from(features).dot(&self.params))
    }

    /// Предсказания для всех строк. Неизвестный уровень категории или пропуск
    /// в предикторе дают ошибку.
    pub fn predict(&self, rows: &[EnrichedRecord]) -> Result<Vec<f64>> {
        rows.iter()
            .enumerate()
            .map(|(i, r)| self.predict_one(r, i))
            .collect()
    }

    /// Как `predict`, но строки с неизвестными уровнями или пропусками исключаются
    pub fn predict_defined(&self, rows: &[EnrichedRecord]) -> Result<Predictions> {
        let mut out = Predictions {
            rows: Vec::with_capacity(rows.len()),
            values: Vec::with_capacity(rows.len()),
            excluded: 0,
        };

        for (i, record) in rows.iter().enumerate() {
            match self.predict_one(record, i) {
                Ok(value) => {
                    out.rows.push(i);
                    out.values.push(value);
                }
                Err(e @ (PipelineError::UnseenLevel { .. } | PipelineError::MissingValue { .. })) => {
                    tracing::debug!("Excluding row {} from {}: {}", i, self.formula, e);
                    out.excluded += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if out.excluded > 0 {
            tracing::warn!(
                "{}: {} rows excluded from prediction (unseen levels or missing predictors)",
                self.formula,
                out.excluded
            );
        }

        Ok(out)
    }
}
