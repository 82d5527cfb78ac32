//! Фикстуры для тестов модулей

use chrono::NaiveDate;

use crate::types::{
    AgeGroup, BloodPressureCategory, BmiCategory, EnrichedRecord, Gender, SleepCategory,
    SleepDisorder, SleepRecord,
};

pub fn record(stress: f64, activity: f64) -> SleepRecord {
    SleepRecord {
        person_id: 1,
        gender: Gender::Male,
        age: 35.0,
        occupation: "Nurse".to_string(),
        sleep_duration: 7.0,
        quality_of_sleep: 7.0,
        physical_activity_level: Some(activity),
        stress_level: stress,
        bmi_category: BmiCategory::Normal,
        blood_pressure: "120/80".to_string(),
        heart_rate: Some(70.0),
        daily_steps: Some(7000.0),
        sleep_disorder: SleepDisorder::None,
    }
}

/// Запись с уже посчитанными производными полями; значения согласованы с `record`
pub fn enriched(stress: f64, activity: f64) -> EnrichedRecord {
    EnrichedRecord {
        record: record(stress, activity),
        blood_pressure: Some(120.0),
        systolic_bp: Some(120.0),
        diastolic_bp: Some(80.0),
        avg_stress: stress,
        stress_relative: 0.0,
        sleep_category: SleepCategory::Good,
        sleep_efficiency: Some(1.0),
        age_group: Some(AgeGroup::Middle),
        bmi_numeric: Some(22.0),
        sleep_duration_z: 0.0,
        quality_of_sleep_z: 0.0,
        occupation_group: "Nurse".to_string(),
        blood_pressure_category: Some(BloodPressureCategory::Elevated),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    }
}
