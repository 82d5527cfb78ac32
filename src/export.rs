//! Выгрузка обогащённой таблицы в CSV

use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::error::{PipelineError, Result};
use crate::types::EnrichedRecord;

const HEADER: [&str; 27] = [
    "Person_ID",
    "Gender",
    "Age",
    "Occupation",
    "Sleep_Duration",
    "Quality_of_Sleep",
    "Physical_Activity_Level",
    "Stress_Level",
    "BMI_Category",
    "Blood_Pressure_Raw",
    "Heart_Rate",
    "Daily_Steps",
    "Sleep_Disorder",
    "Blood_Pressure",
    "Systolic_BP",
    "Diastolic_BP",
    "Avg_Stress",
    "Stress_Relative",
    "Sleep_Category",
    "Sleep_Efficiency",
    "Age_Group",
    "BMI_Numeric",
    "Sleep_Duration_Z",
    "Quality_of_Sleep_Z",
    "Occupation_Group",
    "Blood_Pressure_Category",
    "Date",
];

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "NA".to_string())
}

fn to_fields(row: &EnrichedRecord) -> Vec<String> {
    let r = &row.record;
    vec![
        r.person_id.to_string(),
        r.gender.to_string(),
        r.age.to_string(),
        r.occupation.clone(),
        r.sleep_duration.to_string(),
        r.quality_of_sleep.to_string(),
        opt(r.physical_activity_level),
        r.stress_level.to_string(),
        r.bmi_category.to_string(),
        r.blood_pressure.clone(),
        opt(r.heart_rate),
        opt(r.daily_steps),
        r.sleep_disorder.to_string(),
        opt(row.blood_pressure),
        opt(row.systolic_bp),
        opt(row.diastolic_bp),
        row.avg_stress.to_string(),
        row.stress_relative.to_string(),
        row.sleep_category.to_string(),
        opt(row.sleep_efficiency),
        row.age_group.map(|g| g.to_string()).unwrap_or_else(|| "NA".to_string()),
        opt(row.bmi_numeric),
        row.sleep_duration_z.to_string(),
        row.quality_of_sleep_z.to_string(),
        row.occupation_group.clone(),
        row.blood_pressure_category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "NA".to_string()),
        row.date.format("%Y-%m-%d").to_string(),
    ]
}

pub fn write_enriched<W: Write>(writer: W, rows: &[EnrichedRecord]) -> Result<()> {
    let export_error = |e: csv::Error| PipelineError::Export(e.to_string());

    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(HEADER).map_err(export_error)?;
    for row in rows {
        csv_writer.write_record(to_fields(row)).map_err(export_error)?;
    }
    csv_writer
        .flush()
        .map_err(|e| PipelineError::Export(e.to_string()))
}

pub fn write_enriched_csv(path: &Path, rows: &[EnrichedRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| PipelineError::Export(format!("{}: {}", path.display(), e)))?;
    write_enriched(file, rows)?;
    tracing::info!("Wrote {} enriched rows to {}", rows.len(), path.display());
    Ok(())
}
