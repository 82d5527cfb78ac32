//! Нормализация и простые статистики колонок

use ndarray::Array1;

/// Среднее и стандартное отклонение (генеральное, ddof = 0) одной колонки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

impl ColumnStats {
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let column = Array1::from(values.to_vec());
        let mean = column.mean()?;
        let mut std = column.std(0.0);

        // Избегаем деления на ноль
        if std < 1e-10 {
            std = 1.0;
        }

        Some(Self { mean, std })
    }

    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.z_score(v)).collect()
    }
}

/// z-оценки по всей колонке; для пустой колонки пустой результат
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    match ColumnStats::fit(values) {
        Some(stats) => stats.transform(values),
        None => Vec::new(),
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Коэффициент корреляции Пирсона; None при нулевой дисперсии
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let mx = mean(xs)?;
    let my = mean(ys)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }

    if sxx < 1e-12 || syy < 1e-12 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}
