//! Метрики качества предсказаний

use crate::error::{PipelineError, Result};

/// Корень из среднего квадрата ошибки
pub fn rmse(observed: &[f64], predicted: &[f64]) -> Result<f64> {
    if observed.len() != predicted.len() {
        return Err(PipelineError::LengthMismatch {
            observed: observed.len(),
            predicted: predicted.len(),
        });
    }
    if observed.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let mse = observed
        .iter()
        .zip(predicted)
        .map(|(o, p)| (o - p).powi(2))
        .sum::<f64>()
        / observed.len() as f64;

    Ok(mse.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn perfect_predictions() {
        assert_eq!(rmse(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap(), 0.0);
    }

    #[test]
    fn pins_the_formula() {
        // mean(9, 16) = 12.5
        assert_abs_diff_eq!(rmse(&[0.0, 0.0], &[3.0, 4.0]).unwrap(), 3.5355, epsilon = 1e-4);
        assert_abs_diff_eq!(rmse(&[3.0, 4.0], &[0.0, 0.0]).unwrap(), 12.5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn length_mismatch() {
        assert!(matches!(
            rmse(&[1.0], &[1.0, 2.0]),
            Err(PipelineError::LengthMismatch { observed: 1, predicted: 2 })
        ));
    }

    #[test]
    fn empty_input() {
        assert!(matches!(rmse(&[], &[]), Err(PipelineError::EmptyInput)));
    }
}
