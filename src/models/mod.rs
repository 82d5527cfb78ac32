/// Регрессионные модели

pub mod formula;
pub mod regression;
pub mod selection;

pub use formula::{CategoricalColumn, Formula, NumericColumn, Term};
pub use regression::{Coefficient, FittedModel, OlsModel, Predictions};
pub use selection::{score, select_model, CandidateScore, ModelSelection, Score};
