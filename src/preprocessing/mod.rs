/// Модуль предобработки данных

pub mod cleaning;
pub mod feature_engineering;
pub mod loader;
pub mod normalization;
pub mod split;

pub use cleaning::{clean, CleaningOptions};
pub use feature_engineering::{derive_features, EnrichedTable, FeatureEngineer, FeatureOptions};
pub use loader::{load_csv, RawTable};
pub use normalization::ColumnStats;
pub use split::{stratified_split, Split, SplitOptions};
