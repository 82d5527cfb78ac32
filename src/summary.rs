//! Описательная сводка по обогащённой таблице

use std::collections::BTreeMap;

use serde::Serialize;

use crate::preprocessing::feature_engineering::EnrichedTable;
use crate::preprocessing::normalization::{mean, pearson};
use crate::types::EnrichedRecord;

#[derive(Debug, Clone, Serialize)]
pub struct GroupMeans {
    pub group: String,
    pub n: usize,
    pub mean_sleep_duration: f64,
    pub mean_quality_of_sleep: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub outliers_replaced: usize,
    pub sleep_disorder_counts: BTreeMap<String, usize>,
    pub sleep_category_counts: BTreeMap<String, usize>,
    pub age_group_counts: BTreeMap<String, usize>,
    pub blood_pressure_category_counts: BTreeMap<String, usize>,
    pub occupation_groups: Vec<GroupMeans>,
    pub stress_sleep_correlation: Option<f64>,
    pub activity_quality_correlation: Option<f64>,
}

fn counts<F>(rows: &[EnrichedRecord], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&EnrichedRecord) -> Option<String>,
{
    let mut out = BTreeMap::new();
    for row in rows {
        let label = key(row).unwrap_or_else(|| "NA".to_string());
        *out.entry(label).or_insert(0) += 1;
    }
    out
}

pub fn summarize(table: &EnrichedTable) -> DatasetSummary {
    let rows = &table.records;

    let mut by_group: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in rows {
        let (durations, qualities) = by_group.entry(row.occupation_group.as_str()).or_default();
        durations.push(row.record.sleep_duration);
        qualities.push(row.record.quality_of_sleep);
    }

    let mut occupation_groups: Vec<GroupMeans> = by_group
        .into_iter()
        .map(|(group, (durations, qualities))| GroupMeans {
            group: group.to_string(),
            n: durations.len(),
            mean_sleep_duration: mean(&durations).unwrap_or(f64::NAN),
            mean_quality_of_sleep: mean(&qualities).unwrap_or(f64::NAN),
        })
        .collect();
    occupation_groups.sort_by(|a, b| b.n.cmp(&a.n).then_with(|| a.group.cmp(&b.group)));

    let stress: Vec<f64> = rows.iter().map(|r| r.record.stress_level).collect();
    let duration: Vec<f64> = rows.iter().map(|r| r.record.sleep_duration).collect();

    let (activity, quality): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .filter_map(|r| r.record.physical_activity_level.map(|a| (a, r.record.quality_of_sleep)))
        .unzip();

    DatasetSummary {
        rows: rows.len(),
        outliers_replaced: table.outliers_replaced,
        sleep_disorder_counts: counts(rows, |r| Some(r.record.sleep_disorder.to_string())),
        sleep_category_counts: counts(rows, |r| Some(r.sleep_category.to_string())),
        age_group_counts: counts(rows, |r| r.age_group.map(|g| g.to_string())),
        blood_pressure_category_counts: counts(rows, |r| {
            r.blood_pressure_category.map(|c| c.to_string())
        }),
        occupation_groups,
        stress_sleep_correlation: pearson(&stress, &duration),
        activity_quality_correlation: pearson(&activity, &quality),
    }
}
