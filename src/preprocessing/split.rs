//! Стратифицированное разбиение на train / validation / test

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub train_fraction: f64,
    /// Доля остатка, которая идёт в validation; остальное в test
    pub validation_share: f64,
    pub seed: u64,
    pub require_every_partition: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            train_fraction: 0.7,
            validation_share: 0.5,
            seed: 123,
            require_every_partition: true,
        }
    }
}

/// Индексы строк каждой части, по возрастанию
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// train и validation вместе, для финального переобучения
    pub fn train_validation(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.train.iter().chain(&self.validation).copied().collect();
        indices.sort_unstable();
        indices
    }
}

pub fn select<T: Clone>(rows: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| rows[i].clone()).collect()
}

/// Размеры частей для одной страты
fn partition_sizes(n: usize, options: &SplitOptions) -> (usize, usize, usize) {
    let mut n_train = (n as f64 * options.train_fraction).round() as usize;
    if options.require_every_partition {
        n_train = n_train.clamp(1, n - 2);
    }
    let n_train = n_train.min(n);

    let rest = n - n_train;
    let mut n_val = (rest as f64 * options.validation_share).round() as usize;
    if options.require_every_partition {
        n_val = n_val.clamp(1, rest - 1);
    }
    let n_val = n_val.min(rest);

    (n_train, n_val, rest - n_val)
}

/// Разбиение с сохранением долей каждого значения метки.
///
/// Страты обходятся в лексическом порядке меток, каждая перемешивается одним
/// генератором с заданным seed, так что результат воспроизводим.
pub fn stratified_split<T, F>(rows: &[T], label: F, options: &SplitOptions) -> Result<Split>
where
    F: Fn(&T) -> String,
{
    if rows.is_empty() {
        return Err(PipelineError::InsufficientData("cannot split an empty table".to_string()));
    }

    let mut strata: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        strata.entry(label(row)).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut split = Split {
        train: Vec::new(),
        validation: Vec::new(),
        test: Vec::new(),
    };

    for (stratum, mut indices) in strata {
        let n = indices.len();
        if options.require_every_partition && n < 3 {
            return Err(PipelineError::InsufficientData(format!(
                "stratum {:?} has {} row(s), at least 3 are needed to fill train, validation and test",
                stratum, n
            )));
        }

        indices.shuffle(&mut rng);
        let (n_train, n_val, n_test) = partition_sizes(n, options);

        tracing::debug!(
            "Stratum {:?}: {} train, {} validation, {} test",
            stratum,
            n_train,
            n_val,
            n_test
        );

        split.train.extend_from_slice(&indices[..n_train]);
        split.validation.extend_from_slice(&indices[n_train..n_train + n_val]);
        split.test.extend_from_slice(&indices[n_train + n_val..]);
    }

    split.train.sort_unstable();
    split.validation.sort_unstable();
    split.test.sort_unstable();

    tracing::info!(
        "Split {} rows: {} train, {} validation, {} test",
        rows.len(),
        split.train.len(),
        split.validation.len(),
        split.test.len()
    );

    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn labels(counts: &[(&str, usize)]) -> Vec<String> {
        counts
            .iter()
            .flat_map(|(label, n)| std::iter::repeat(label.to_string()).take(*n))
            .collect()
    }

    #[test]
    fn partitions_are_disjoint_and_exhaustive() {
        let rows = labels(&[("None", 219), ("Sleep Apnea", 78), ("Insomnia", 77)]);
        let split = stratified_split(&rows, |r| r.clone(), &SplitOptions::default()).unwrap();

        let mut seen = HashSet::new();
        for &i in split.train.iter().chain(&split.validation).chain(&split.test) {
            assert!(seen.insert(i), "row {i} appears twice");
        }
        assert_eq!(seen.len(), rows.len());
        assert_eq!(split.len(), rows.len());
    }

    #[test]
    fn per_stratum_counts_follow_targets() {
        let counts = [("None", 219), ("Sleep Apnea", 78), ("Insomnia", 77)];
        let rows = labels(&counts);
        let split = stratified_split(&rows, |r| r.clone(), &SplitOptions::default()).unwrap();

        for (label, n) in counts {
            let in_part = |part: &[usize]| part.iter().filter(|&&i| rows[i] == label).count() as f64;
            let n = n as f64;
            assert!((in_part(&split.train) - n * 0.7).abs() <= 2.0, "{label} train");
            assert!((in_part(&split.validation) - n * 0.15).abs() <= 2.0, "{label} validation");
            assert!((in_part(&split.test) - n * 0.15).abs() <= 2.0, "{label} test");
        }
    }

    #[test]
    fn same_seed_same_membership() {
        let rows = labels(&[("a", 40), ("b", 25)]);
        let options = SplitOptions::default();
        let first = stratified_split(&rows, |r| r.clone(), &options).unwrap();
        let second = stratified_split(&rows, |r| r.clone(), &options).unwrap();
        assert_eq!(first, second);

        let other = SplitOptions { seed: 124, ..options };
        let third = stratified_split(&rows, |r| r.clone(), &other).unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn tiny_stratum_is_rejected() {
        let rows = labels(&[("a", 30), ("rare", 2)]);
        let err = stratified_split(&rows, |r| r.clone(), &SplitOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(msg) if msg.contains("rare")));
    }

    #[test]
    fn small_strata_still_fill_every_partition() {
        let rows = labels(&[("a", 3), ("b", 4)]);
        let split = stratified_split(&rows, |r| r.clone(), &SplitOptions::default()).unwrap();
        for label in ["a", "b"] {
            for part in [&split.train, &split.validation, &split.test] {
                assert!(part.iter().any(|&i| rows[i] == label));
            }
        }
    }

    #[test]
    fn tiny_stratum_allowed_when_not_required() {
        let rows = labels(&[("a", 30), ("rare", 1)]);
        let options = SplitOptions {
            require_every_partition: false,
            ..SplitOptions::default()
        };
        let split = stratified_split(&rows, |r| r.clone(), &options).unwrap();
        assert_eq!(split.len(), 31);
    }

    #[test]
    fn empty_table_is_rejected() {
        let rows: Vec<String> = Vec::new();
        assert!(stratified_split(&rows, |r| r.clone(), &SplitOptions::default()).is_err());
    }
}
