//! Формулы моделей в стиле R: `target ~ a * b + c`

use std::fmt;

use crate::error::{PipelineError, Result};
use crate::types::EnrichedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    SleepDuration,
    QualityOfSleep,
    Age,
    PhysicalActivityLevel,
    StressLevel,
    HeartRate,
    DailySteps,
    BloodPressure,
    SystolicBp,
    DiastolicBp,
    AvgStress,
    StressRelative,
    SleepEfficiency,
    BmiNumeric,
    SleepDurationZ,
    QualityOfSleepZ,
}

impl NumericColumn {
    const ALL: [NumericColumn; 16] = [
        NumericColumn::SleepDuration,
        NumericColumn::QualityOfSleep,
        NumericColumn::Age,
        NumericColumn::PhysicalActivityLevel,
        NumericColumn::StressLevel,
        NumericColumn::HeartRate,
        NumericColumn::DailySteps,
        NumericColumn::BloodPressure,
        NumericColumn::SystolicBp,
        NumericColumn::DiastolicBp,
        NumericColumn::AvgStress,
        NumericColumn::StressRelative,
        NumericColumn::SleepEfficiency,
        NumericColumn::BmiNumeric,
        NumericColumn::SleepDurationZ,
        NumericColumn::QualityOfSleepZ,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NumericColumn::SleepDuration => "Sleep_Duration",
            NumericColumn::QualityOfSleep => "Quality_of_Sleep",
            NumericColumn::Age => "Age",
            NumericColumn::PhysicalActivityLevel => "Physical_Activity_Level",
            NumericColumn::StressLevel => "Stress_Level",
            NumericColumn::HeartRate => "Heart_Rate",
            NumericColumn::DailySteps => "Daily_Steps",
            NumericColumn::BloodPressure => "Blood_Pressure",
            NumericColumn::SystolicBp => "Systolic_BP",
            NumericColumn::DiastolicBp => "Diastolic_BP",
            NumericColumn::AvgStress => "Avg_Stress",
            NumericColumn::StressRelative => "Stress_Relative",
            NumericColumn::SleepEfficiency => "Sleep_Efficiency",
            NumericColumn::BmiNumeric => "BMI_Numeric",
            NumericColumn::SleepDurationZ => "Sleep_Duration_Z",
            NumericColumn::QualityOfSleepZ => "Quality_of_Sleep_Z",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn value(&self, row: &EnrichedRecord) -> Option<f64> {
        let r = &row.record;
        match self {
            NumericColumn::SleepDuration => Some(r.sleep_duration),
            NumericColumn::QualityOfSleep => Some(r.quality_of_sleep),
            NumericColumn::Age => Some(r.age),
            NumericColumn::PhysicalActivityLevel => r.physical_activity_level,
            NumericColumn::StressLevel => Some(r.stress_level),
            NumericColumn::HeartRate => r.heart_rate,
            NumericColumn::DailySteps => r.daily_steps,
            NumericColumn::BloodPressure => row.blood_pressure,
            NumericColumn::SystolicBp => row.systolic_bp,
            NumericColumn::DiastolicBp => row.diastolic_bp,
            NumericColumn::AvgStress => Some(row.avg_stress),
            NumericColumn::StressRelative => Some(row.stress_relative),
            NumericColumn::SleepEfficiency => row.sleep_efficiency,
            NumericColumn::BmiNumeric => row.bmi_numeric,
            NumericColumn::SleepDurationZ => Some(row.sleep_duration_z),
            NumericColumn::QualityOfSleepZ => Some(row.quality_of_sleep_z),
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalColumn {
    Gender,
    Occupation,
    OccupationGroup,
    BmiCategory,
    SleepDisorder,
    SleepCategory,
    AgeGroup,
    BloodPressureCategory,
}

impl CategoricalColumn {
    const ALL: [CategoricalColumn; 8] = [
        CategoricalColumn::Gender,
        CategoricalColumn::Occupation,
        CategoricalColumn::OccupationGroup,
        CategoricalColumn::BmiCategory,
        CategoricalColumn::SleepDisorder,
        CategoricalColumn::SleepCategory,
        CategoricalColumn::AgeGroup,
        CategoricalColumn::BloodPressureCategory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CategoricalColumn::Gender => "Gender",
            CategoricalColumn::Occupation => "Occupation",
            CategoricalColumn::OccupationGroup => "Occupation_Group",
            CategoricalColumn::BmiCategory => "BMI_Category",
            CategoricalColumn::SleepDisorder => "Sleep_Disorder",
            CategoricalColumn::SleepCategory => "Sleep_Category",
            CategoricalColumn::AgeGroup => "Age_Group",
            CategoricalColumn::BloodPressureCategory => "Blood_Pressure_Category",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn level(&self, row: &EnrichedRecord) -> Option<String> {
        let r = &row.record;
        match self {
            CategoricalColumn::Gender => Some(r.gender.to_string()),
            CategoricalColumn::Occupation => Some(r.occupation.clone()),
            CategoricalColumn::OccupationGroup => Some(row.occupation_group.clone()),
            CategoricalColumn::BmiCategory => Some(r.bmi_category.to_string()),
            CategoricalColumn::SleepDisorder => Some(r.sleep_disorder.to_string()),
            CategoricalColumn::SleepCategory => Some(row.sleep_category.to_string()),
            CategoricalColumn::AgeGroup => row.age_group.map(|g| g.to_string()),
            CategoricalColumn::BloodPressureCategory => {
                row.blood_pressure_category.map(|c| c.to_string())
            }
        }
    }
}

impl fmt::Display for CategoricalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    Numeric(NumericColumn),
    Categorical(CategoricalColumn),
    /// Произведение двух числовых колонок
    Interaction(NumericColumn, NumericColumn),
}

impl Term {
    /// `a:b` и `b:a` это один и тот же член
    fn same_as(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Interaction(a, b), Term::Interaction(c, d)) => {
                (a == c && b == d) || (a == d && b == c)
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Numeric(c) => write!(f, "{}", c),
            Term::Categorical(c) => write!(f, "{}", c),
            Term::Interaction(a, b) => write!(f, "{}:{}", a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub target: NumericColumn,
    pub terms: Vec<Term>,
}

impl Formula {
    /// Разбор формулы. `a * b` раскрывается в `a + b + a:b`, повторы убираются
    /// (`b:a` считается повтором `a:b`, `a:a` сводится к `a`).
    /// Поддерживаются только парные взаимодействия.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: String| PipelineError::InvalidFormula {
            formula: text.to_string(),
            reason,
        };

        let (lhs, rhs) = text
            .split_once('~')
            .ok_or_else(|| invalid("expected `target ~ terms`".to_string()))?;

        let target = NumericColumn::from_name(lhs.trim())
            .ok_or_else(|| invalid(format!("unknown numeric target `{}`", lhs.trim())))?;

        let numeric = |name: &str| {
            NumericColumn::from_name(name)
                .ok_or_else(|| invalid(format!("interaction needs numeric columns, got `{}`", name)))
        };

        let mut terms: Vec<Term> = Vec::new();
        let mut push = |term: Term| {
            let term = match term {
                Term::Interaction(a, b) if a == b => Term::Numeric(a),
                other => other,
            };
            if !terms.iter().any(|t| t.same_as(&term)) {
                terms.push(term);
            }
        };

        for raw in rhs.split('+') {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(invalid("empty term".to_string()));
            }
            if raw.matches(['*', ':']).count() > 1 {
                return Err(invalid(format!(
                    "only two-way interactions are supported, got `{}`",
                    raw
                )));
            }

            if let Some((a, b)) = raw.split_once('*') {
                let (a, b) = (numeric(a.trim())?, numeric(b.trim())?);
                push(Term::Numeric(a));
                push(Term::Numeric(b));
                push(Term::Interaction(a, b));
            } else if let Some((a, b)) = raw.split_once(':') {
                push(Term::Interaction(numeric(a.trim())?, numeric(b.trim())?));
            } else if let Some(c) = NumericColumn::from_name(raw) {
                push(Term::Numeric(c));
            } else if let Some(c) = CategoricalColumn::from_name(raw) {
                push(Term::Categorical(c));
            } else {
                return Err(invalid(format!("unknown column `{}`", raw)));
            }
        }

        let uses_target = terms.iter().any(|t| match t {
            Term::Numeric(c) => *c == target,
            Term::Interaction(a, b) => *a == target || *b == target,
            Term::Categorical(_) => false,
        });
        if uses_target {
            return Err(invalid(format!("target `{}` appears among predictors", target)));
        }

        Ok(Self { target, terms })
    }

}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        write!(f, "{} ~ {}", self.target, terms.join(" + "))
    }
}
