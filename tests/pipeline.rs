use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sleep_ml::{
    pipeline, BloodPressureCategory, PipelineConfig, PipelineError, SleepCategory, Stage,
};

const HEADER: &str = "Person ID,Gender,Age,Occupation,Sleep Duration,Quality of Sleep,\
Physical Activity Level,Stress Level,BMI Category,Blood Pressure,Heart Rate,Daily Steps,Sleep Disorder";

const OCCUPATIONS: [&str; 7] = [
    "Nurse",
    "Doctor",
    "Engineer",
    "Lawyer",
    "Teacher",
    "Accountant",
    "Salesperson",
];

/// Синтетический опрос: длительность сна падает со стрессом, качество растёт с длительностью
fn survey_csv(disorders: &[(&str, usize)]) -> String {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut lines = vec![HEADER.to_string()];
    let mut id = 0;

    for &(disorder, n) in disorders {
        for _ in 0..n {
            id += 1;
            let age = rng.gen_range(27..=59) as f64;
            let stress = rng.gen_range(3..=8) as f64;
            let activity = rng.gen_range(30..=90) as f64;
            let bmi = ["Normal", "Overweight", "Obese"][rng.gen_range(0..3)];
            let bmi_shift = match bmi {
                "Normal" => 0.0,
                "Overweight" => -0.3,
                _ => -0.6,
            };
            let duration =
                9.0 - 0.35 * stress + 0.006 * activity + bmi_shift + rng.gen_range(-0.3..0.3);
            let duration = (duration * 10.0).round() / 10.0;
            let heart_rate = rng.gen_range(60..=85) as f64;
            let systolic = rng.gen_range(115..=142);
            let diastolic = rng.gen_range(75..=95);
            let quality = (1.2 * duration - 0.02 * age + 0.5 + rng.gen_range(-0.5..0.5)).round();
            let occupation = OCCUPATIONS[id % OCCUPATIONS.len()];
            let gender = if id % 2 == 0 { "Male" } else { "Female" };
            let steps = 3000 + (activity as usize) * 80;

            lines.push(format!(
                "{id},{gender},{age},{occupation},{duration},{quality},{activity},{stress},{bmi},{systolic}/{diastolic},{heart_rate},{steps},{disorder}"
            ));
        }
    }

    lines.join("\n") + "\n"
}

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn config() -> PipelineConfig {
    PipelineConfig {
        date_seed: Some(5),
        run_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
        ..PipelineConfig::default()
    }
}

#[test]
fn full_run_produces_rmse_for_both_models() {
    let file = write_temp(&survey_csv(&[("None", 120), ("Insomnia", 40), ("Sleep Apnea", 40)]));
    let output = pipeline::run(file.path(), &config()).unwrap();
    let report = &output.report;

    assert_eq!(report.summary.rows, 200);
    assert_eq!(report.split.train + report.split.validation + report.split.test, 200);
    assert_eq!(report.models.len(), 2);

    for model in &report.models {
        assert!(model.validation_rmse.is_finite() && model.validation_rmse >= 0.0);
        assert!(model.test.rmse.is_finite() && model.test.rmse >= 0.0);
        assert_eq!(model.test.n + model.test.excluded, report.split.test);
        assert_eq!(model.coefficients[0].name, "(Intercept)");
    }

    assert_eq!(report.models[0].target, "Sleep_Duration");
    assert_eq!(report.models[1].target, "Quality_of_Sleep");

    // Генерирующая модель линейна: ошибка порядка шума
    assert!(report.models[0].test.rmse < 0.5, "{}", report.models[0].test.rmse);

    let text = report.to_string();
    assert!(text.contains("Sleep duration model validation RMSE: "));
    assert!(text.contains("Sleep quality model test RMSE: "));
}

#[test]
fn derived_columns_follow_rules() {
    let file = write_temp(&survey_csv(&[("None", 60), ("Insomnia", 20), ("Sleep Apnea", 20)]));
    let output = pipeline::run(file.path(), &config()).unwrap();

    let mut groups = std::collections::HashSet::new();
    for row in &output.table.records {
        let r = &row.record;
        let expected = if r.sleep_duration >= 7.0 && r.quality_of_sleep >= 7.0 {
            SleepCategory::Good
        } else if r.sleep_duration < 6.0 || r.quality_of_sleep < 5.0 {
            SleepCategory::Poor
        } else {
            SleepCategory::Average
        };
        assert_eq!(row.sleep_category, expected);

        let bp = row.blood_pressure.unwrap();
        assert_eq!(Some(bp), row.systolic_bp);
        assert_eq!(
            row.blood_pressure_category,
            Some(match bp {
                v if v < 120.0 => BloodPressureCategory::Normal,
                v if v < 130.0 => BloodPressureCategory::Elevated,
                v if v < 140.0 => BloodPressureCategory::HighStage1,
                _ => BloodPressureCategory::HighStage2,
            })
        );
        groups.insert(row.occupation_group.clone());
    }

    // 5 самых частых занятий и "Other"
    assert_eq!(groups.len(), 6);
    assert!(groups.contains("Other"));
}

#[test]
fn same_seed_reproduces_split_and_coefficients() {
    let file = write_temp(&survey_csv(&[("None", 90), ("Insomnia", 30), ("Sleep Apnea", 30)]));

    let first = pipeline::run(file.path(), &config()).unwrap();
    let second = pipeline::run(file.path(), &config()).unwrap();

    assert_eq!(first.split, second.split);
    for (a, b) in first.report.models.iter().zip(&second.report.models) {
        assert_eq!(a.selected, b.selected);
        let ca: Vec<f64> = a.coefficients.iter().map(|c| c.estimate).collect();
        let cb: Vec<f64> = b.coefficients.iter().map(|c| c.estimate).collect();
        assert_eq!(ca, cb);
    }

    // seed для дат тоже зафиксирован
    let dates_a: Vec<_> = first.table.records.iter().map(|r| r.date).collect();
    let dates_b: Vec<_> = second.table.records.iter().map(|r| r.date).collect();
    assert_eq!(dates_a, dates_b);

    let other = PipelineConfig { seed: 7, ..config() };
    let third = pipeline::run(file.path(), &other).unwrap();
    assert_ne!(first.split, third.split);
}

#[test]
fn split_preserves_disorder_proportions() {
    let counts = [("None", 120), ("Insomnia", 40), ("Sleep Apnea", 40)];
    let file = write_temp(&survey_csv(&counts));
    let output = pipeline::run(file.path(), &config()).unwrap();
    let rows = &output.table.records;

    for (label, n) in counts {
        let count = |part: &[usize]| {
            part.iter()
                .filter(|&&i| rows[i].record.sleep_disorder.to_string() == label)
                .count() as f64
        };
        let n = n as f64;
        assert!((count(&output.split.train) - 0.7 * n).abs() <= 2.0);
        assert!((count(&output.split.validation) - 0.15 * n).abs() <= 2.0);
        assert!((count(&output.split.test) - 0.15 * n).abs() <= 2.0);
    }
}

#[test]
fn tiny_stratum_aborts_in_split_stage() {
    let file = write_temp(&survey_csv(&[("None", 50), ("Insomnia", 2)]));
    let err = pipeline::run(file.path(), &config()).unwrap_err();

    assert_eq!(err.stage, Stage::Split);
    assert!(matches!(err.source, PipelineError::InsufficientData(_)));
    assert!(err.to_string().contains("split"));
}

#[test]
fn missing_file_aborts_in_load_stage() {
    let err = pipeline::run(std::path::Path::new("/no/such/survey.csv"), &config()).unwrap_err();
    assert_eq!(err.stage, Stage::Load);
    assert!(matches!(err.source, PipelineError::DataLoad { .. }));
}

#[test]
fn malformed_value_aborts_in_clean_stage() {
    let mut csv = survey_csv(&[("None", 10)]);
    csv = csv.replacen("Nurse,", "Nurse,abc-", 1);
    let file = write_temp(&csv);

    let err = pipeline::run(file.path(), &config()).unwrap_err();
    assert_eq!(err.stage, Stage::Clean);
    assert!(matches!(err.source, PipelineError::Parse { ref column, .. } if column == "Sleep_Duration"));
}

#[test]
fn report_serializes_to_json() {
    let file = write_temp(&survey_csv(&[("None", 60), ("Insomnia", 20), ("Sleep Apnea", 20)]));
    let output = pipeline::run(file.path(), &config()).unwrap();

    let json = serde_json::to_value(&output.report).unwrap();
    assert_eq!(json["summary"]["rows"], 100);
    assert!(json["models"][0]["test"]["rmse"].is_number());
    assert!(json["models"][1]["selected"].as_str().unwrap().starts_with("Quality_of_Sleep ~"));
}
