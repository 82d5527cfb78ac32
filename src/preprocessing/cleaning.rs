//! Приведение типов: RawTable -> SleepRecord

use csv::StringRecord;

use crate::error::{PipelineError, Result};
use crate::preprocessing::loader::RawTable;
use crate::types::{BmiCategory, Gender, SleepDisorder, SleepRecord};

#[derive(Debug, Clone, Default)]
pub struct CleaningOptions {
    /// Строка давления без цифр считается ошибкой, а не пропуском
    pub strict_blood_pressure: bool,
}

/// Индексы обязательных и необязательных колонок
struct Columns {
    person_id: usize,
    gender: usize,
    age: usize,
    occupation: usize,
    sleep_duration: usize,
    quality_of_sleep: usize,
    physical_activity_level: Option<usize>,
    stress_level: usize,
    bmi_category: usize,
    blood_pressure: usize,
    heart_rate: Option<usize>,
    daily_steps: Option<usize>,
    sleep_disorder: usize,
}

impl Columns {
    fn resolve(table: &RawTable) -> Result<Self> {
        let required = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            person_id: required("Person_ID")?,
            gender: required("Gender")?,
            age: required("Age")?,
            occupation: required("Occupation")?,
            sleep_duration: required("Sleep_Duration")?,
            quality_of_sleep: required("Quality_of_Sleep")?,
            physical_activity_level: table.column_index("Physical_Activity_Level"),
            stress_level: required("Stress_Level")?,
            bmi_category: required("BMI_Category")?,
            blood_pressure: required("Blood_Pressure")?,
            heart_rate: table.column_index("Heart_Rate"),
            daily_steps: table.column_index("Daily_Steps"),
            sleep_disorder: required("Sleep_Disorder")?,
        })
    }
}

fn is_missing(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw.eq_ignore_ascii_case("NA") || raw.eq_ignore_ascii_case("NaN")
}

fn text<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("").trim()
}

fn parse_number(record: &StringRecord, idx: usize, column: &str, row: usize) -> Result<f64> {
    let raw = text(record, idx);
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PipelineError::Parse {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        })
}

fn parse_optional_number(
    record: &StringRecord,
    idx: Option<usize>,
    column: &str,
    row: usize,
) -> Result<Option<f64>> {
    match idx {
        Some(idx) if !is_missing(text(record, idx)) => parse_number(record, idx, column, row).map(Some),
        _ => Ok(None),
    }
}

/// Приведение всех строк таблицы к типизированным записям.
/// Номер строки в ошибках считается с 1 без учёта заголовка.
pub fn clean(table: &RawTable, options: &CleaningOptions) -> Result<Vec<SleepRecord>> {
    let cols = Columns::resolve(table)?;
    let mut records = Vec::with_capacity(table.len());

    for (i, raw) in table.rows.iter().enumerate() {
        let row = i + 1;

        let person_id_raw = text(raw, cols.person_id);
        let person_id = person_id_raw.parse::<i64>().map_err(|_| PipelineError::Parse {
            column: "Person_ID".to_string(),
            row,
            value: person_id_raw.to_string(),
        })?;

        let blood_pressure = text(raw, cols.blood_pressure).to_string();
        if options.strict_blood_pressure && !blood_pressure.chars().any(|c| c.is_ascii_digit()) {
            return Err(PipelineError::Parse {
                column: "Blood_Pressure".to_string(),
                row,
                value: blood_pressure,
            });
        }

        records.push(SleepRecord {
            person_id,
            gender: Gender::parse(text(raw, cols.gender)),
            age: parse_number(raw, cols.age, "Age", row)?,
            occupation: text(raw, cols.occupation).to_string(),
            sleep_duration: parse_number(raw, cols.sleep_duration, "Sleep_Duration", row)?,
            quality_of_sleep: parse_number(raw, cols.quality_of_sleep, "Quality_of_Sleep", row)?,
            physical_activity_level: parse_optional_number(
                raw,
                cols.physical_activity_level,
                "Physical_Activity_Level",
                row,
            )?,
            stress_level: parse_number(raw, cols.stress_level, "Stress_Level", row)?,
            bmi_category: BmiCategory::parse(text(raw, cols.bmi_category)),
            blood_pressure,
            heart_rate: parse_optional_number(raw, cols.heart_rate, "Heart_Rate", row)?,
            daily_steps: parse_optional_number(raw, cols.daily_steps, "Daily_Steps", row)?,
            sleep_disorder: SleepDisorder::parse(text(raw, cols.sleep_disorder)),
        });
    }

    tracing::info!("Cleaned {} records", records.len());
    Ok(records)
}
