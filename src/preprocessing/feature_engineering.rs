//! Производные признаки для анализа сна

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::preprocessing::normalization::{z_scores, ColumnStats, median};
use crate::types::{AgeGroup, BloodPressureCategory, EnrichedRecord, SleepCategory, SleepRecord};

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)").unwrap());
static TRAILING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*$").unwrap());

pub const OTHER_OCCUPATION: &str = "Other";

#[derive(Debug, Clone)]
pub struct FeatureOptions {
    pub top_occupations: usize,
    pub outlier_z_threshold: f64,
    pub run_date: NaiveDate,
    pub date_seed: Option<u64>,
}

impl FeatureOptions {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            top_occupations: 5,
            outlier_z_threshold: 3.0,
            run_date,
            date_seed: None,
        }
    }
}

/// Обогащённая таблица и число заменённых выбросов
#[derive(Debug, Clone)]
pub struct EnrichedTable {
    pub records: Vec<EnrichedRecord>,
    pub outliers_replaced: usize,
}

pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Порядок правил важен: первое совпадение выигрывает
    pub fn categorize_sleep(duration: f64, quality: f64) -> SleepCategory {
        if duration >= 7.0 && quality >= 7.0 {
            SleepCategory::Good
        } else if duration < 6.0 || quality < 5.0 {
            SleepCategory::Poor
        } else {
            SleepCategory::Average
        }
    }

    /// Первое число в строке, где бы оно ни стояло
    pub fn legacy_blood_pressure(raw: &str) -> Option<f64> {
        FIRST_NUMBER.find(raw).and_then(|m| m.as_str().parse().ok())
    }

    /// (систолическое, диастолическое): ведущая и завершающая группы цифр
    pub fn parse_blood_pressure(raw: &str) -> (Option<f64>, Option<f64>) {
        let capture = |re: &Regex| {
            re.captures(raw)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
        };
        (capture(&LEADING_NUMBER), capture(&TRAILING_NUMBER))
    }

    pub fn blood_pressure_category(value: f64) -> BloodPressureCategory {
        if value < 120.0 {
            BloodPressureCategory::Normal
        } else if value < 130.0 {
            BloodPressureCategory::Elevated
        } else if value < 140.0 {
            BloodPressureCategory::HighStage1
        } else {
            BloodPressureCategory::HighStage2
        }
    }

    /// Интервалы (0,30], (30,45], (45,60], (60,∞)
    pub fn age_group(age: f64) -> Option<AgeGroup> {
        if age <= 0.0 || age.is_nan() {
            None
        } else if age <= 30.0 {
            Some(AgeGroup::Young)
        } else if age <= 45.0 {
            Some(AgeGroup::Middle)
        } else if age <= 60.0 {
            Some(AgeGroup::Senior)
        } else {
            Some(AgeGroup::Elderly)
        }
    }

    pub fn sleep_efficiency(duration: f64, quality: f64) -> Option<f64> {
        if duration > 0.0 {
            Some(quality / duration)
        } else {
            None
        }
    }

    /// Среднее значение внутри каждой группы, по всей таблице
    pub fn group_means<K: Eq + Hash + Clone>(keys: &[K], values: &[f64]) -> HashMap<K, f64> {
        let mut sums: HashMap<K, (f64, usize)> = HashMap::new();
        for (key, value) in keys.iter().zip(values) {
            let (sum, count) = sums.entry(key.clone()).or_insert((0.0, 0));
            *sum += value;
            *count += 1;
        }

        sums.into_iter()
            .map(|(key, (sum, count))| (key, sum / count as f64))
            .collect()
    }

    /// Замена выбросов медианой группы.
    ///
    /// Статистики считаются по исходным значениям, поэтому замены не влияют
    /// друг на друга. Пропуски в расчёте не участвуют и остаются пропусками.
    pub fn correct_outliers<K: Eq + Hash>(
        keys: &[K],
        values: &[Option<f64>],
        threshold: f64,
    ) -> (Vec<Option<f64>>, usize) {
        let mut groups: HashMap<&K, Vec<usize>> = HashMap::new();
        for (i, key) in keys.iter().enumerate() {
            if values[i].is_some() {
                groups.entry(key).or_default().push(i);
            }
        }

        let mut corrected = values.to_vec();
        let mut replaced = 0;

        for (_, indices) in groups {
            let original: Vec<f64> = indices.iter().filter_map(|&i| values[i]).collect();
            let (Some(stats), Some(group_median)) = (ColumnStats::fit(&original), median(&original))
            else {
                continue;
            };

            for (&i, &value) in indices.iter().zip(&original) {
                if stats.z_score(value).abs() > threshold {
                    corrected[i] = Some(group_median);
                    replaced += 1;
                }
            }
        }

        (corrected, replaced)
    }

    /// Топ-N занятий по частоте, остальные сворачиваются в "Other".
    /// При равной частоте выше стоит занятие, встреченное раньше.
    pub fn top_categories(values: &[String], keep: usize) -> Vec<String> {
        let mut first_seen: Vec<&String> = Vec::new();
        let mut counts: HashMap<&String, usize> = HashMap::new();
        for value in values {
            let count = counts.entry(value).or_insert(0);
            if *count == 0 {
                first_seen.push(value);
            }
            *count += 1;
        }

        // sort_by стабильна, порядок первого появления сохраняется
        first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));
        first_seen.into_iter().take(keep).cloned().collect()
    }

    pub fn synthetic_dates(n: usize, run_date: NaiveDate, seed: Option<u64>) -> Vec<NaiveDate> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        (0..n)
            .map(|_| run_date - Duration::days(rng.gen_range(1..=365)))
            .collect()
    }
}

/// Все производные признаки в фиксированном порядке. Входные записи не изменяются.
pub fn derive_features(records: &[SleepRecord], options: &FeatureOptions) -> EnrichedTable {
    let n = records.len();

    // 1. Давление
    let legacy_bp: Vec<Option<f64>> = records
        .iter()
        .map(|r| FeatureEngineer::legacy_blood_pressure(&r.blood_pressure))
        .collect();
    let split_bp: Vec<(Option<f64>, Option<f64>)> = records
        .iter()
        .map(|r| FeatureEngineer::parse_blood_pressure(&r.blood_pressure))
        .collect();

    // 2. Средний стресс по профессии
    let occupations: Vec<String> = records.iter().map(|r| r.occupation.clone()).collect();
    let stress: Vec<f64> = records.iter().map(|r| r.stress_level).collect();
    let avg_stress = FeatureEngineer::group_means(&occupations, &stress);

    // 3-4. Категория и эффективность сна
    let efficiency: Vec<Option<f64>> = records
        .iter()
        .map(|r| FeatureEngineer::sleep_efficiency(r.sleep_duration, r.quality_of_sleep))
        .collect();
    let bmi_keys: Vec<_> = records.iter().map(|r| r.bmi_category.clone()).collect();
    let (efficiency, outliers_replaced) =
        FeatureEngineer::correct_outliers(&bmi_keys, &efficiency, options.outlier_z_threshold);

    // 6. z-оценки по всей таблице
    let duration_z = z_scores(&records.iter().map(|r| r.sleep_duration).collect::<Vec<_>>());
    let quality_z = z_scores(&records.iter().map(|r| r.quality_of_sleep).collect::<Vec<_>>());

    // 7. Группы профессий
    let top = FeatureEngineer::top_categories(&occupations, options.top_occupations);

    // 9. Синтетические даты
    let dates = FeatureEngineer::synthetic_dates(n, options.run_date, options.date_seed);

    let enriched: Vec<EnrichedRecord> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let group_stress = avg_stress[&r.occupation];
            let occupation_group = if top.contains(&r.occupation) {
                r.occupation.clone()
            } else {
                OTHER_OCCUPATION.to_string()
            };

            EnrichedRecord {
                record: r.clone(),
                blood_pressure: legacy_bp[i],
                systolic_bp: split_bp[i].0,
                diastolic_bp: split_bp[i].1,
                avg_stress: group_stress,
                stress_relative: r.stress_level - group_stress,
                sleep_category: FeatureEngineer::categorize_sleep(r.sleep_duration, r.quality_of_sleep),
                sleep_efficiency: efficiency[i],
                age_group: FeatureEngineer::age_group(r.age),
                bmi_numeric: r.bmi_category.numeric(),
                sleep_duration_z: duration_z[i],
                quality_of_sleep_z: quality_z[i],
                occupation_group,
                blood_pressure_category: legacy_bp[i].map(FeatureEngineer::blood_pressure_category),
                date: dates[i],
            }
        })
        .collect();

    tracing::info!(
        "Derived features for {} records ({} efficiency outliers replaced, top occupations: {:?})",
        n,
        outliers_replaced,
        top
    );

    EnrichedTable {
        records: enriched,
        outliers_replaced,
    }
}
