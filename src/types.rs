/// Типы данных для анализа сна

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Пол участника. Неизвестные значения сохраняются как есть.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other(String),
}

impl Gender {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Male" => Gender::Male,
            "Female" => Gender::Female,
            other => Gender::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BmiCategory {
    Normal,
    Overweight,
    Obese,
    Other(String),
}

impl BmiCategory {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Normal" => BmiCategory::Normal,
            "Overweight" => BmiCategory::Overweight,
            "Obese" => BmiCategory::Obese,
            other => BmiCategory::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
            BmiCategory::Other(raw) => raw,
        }
    }

    /// Числовой заменитель ИМТ; только для трёх известных категорий
    pub fn numeric(&self) -> Option<f64> {
        match self {
            BmiCategory::Normal => Some(22.0),
            BmiCategory::Overweight => Some(27.0),
            BmiCategory::Obese => Some(32.0),
            BmiCategory::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SleepDisorder {
    None,
    Insomnia,
    SleepApnea,
    Other(String),
}

impl SleepDisorder {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "None" => SleepDisorder::None,
            "Insomnia" => SleepDisorder::Insomnia,
            "Sleep Apnea" => SleepDisorder::SleepApnea,
            other => SleepDisorder::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SleepDisorder::None => "None",
            SleepDisorder::Insomnia => "Insomnia",
            SleepDisorder::SleepApnea => "Sleep Apnea",
            SleepDisorder::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SleepCategory {
    Good,
    Average,
    Poor,
}

impl SleepCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepCategory::Good => "Good",
            SleepCategory::Average => "Average",
            SleepCategory::Poor => "Poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AgeGroup {
    Young,
    Middle,
    Senior,
    Elderly,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Young => "Young",
            AgeGroup::Middle => "Middle",
            AgeGroup::Senior => "Senior",
            AgeGroup::Elderly => "Elderly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BloodPressureCategory {
    Normal,
    Elevated,
    #[serde(rename = "High Stage 1")]
    HighStage1,
    #[serde(rename = "High Stage 2")]
    HighStage2,
}

impl BloodPressureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodPressureCategory::Normal => "Normal",
            BloodPressureCategory::Elevated => "Elevated",
            BloodPressureCategory::HighStage1 => "High Stage 1",
            BloodPressureCategory::HighStage2 => "High Stage 2",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Gender, BmiCategory, SleepDisorder, SleepCategory, AgeGroup, BloodPressureCategory);

/// Одна строка опроса после приведения типов
#[derive(Debug, Clone, PartialEq)]
pub struct SleepRecord {
    pub person_id: i64,
    pub gender: Gender,
    pub age: f64,
    pub occupation: String,
    pub sleep_duration: f64,
    pub quality_of_sleep: f64,
    pub physical_activity_level: Option<f64>,
    pub stress_level: f64,
    pub bmi_category: BmiCategory,
    /// "систолическое/диастолическое", без разбора
    pub blood_pressure: String,
    pub heart_rate: Option<f64>,
    pub daily_steps: Option<f64>,
    pub sleep_disorder: SleepDisorder,
}

/// Запись с производными признаками
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: SleepRecord,
    /// Первое число в строке давления (исторический вариант)
    pub blood_pressure: Option<f64>,
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
    pub avg_stress: f64,
    pub stress_relative: f64,
    pub sleep_category: SleepCategory,
    pub sleep_efficiency: Option<f64>,
    pub age_group: Option<AgeGroup>,
    pub bmi_numeric: Option<f64>,
    pub sleep_duration_z: f64,
    pub quality_of_sleep_z: f64,
    pub occupation_group: String,
    pub blood_pressure_category: Option<BloodPressureCategory>,
    pub date: NaiveDate,
}
