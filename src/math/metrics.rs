//! Goodness-of-fit metrics.

/// Coefficient of determination `R² = 1 - SS_res / SS_tot`.
///
/// For a constant target (`SS_tot == 0`) this returns 1.0 on a perfect fit and
/// 0.0 otherwise. Returns `None` for mismatched or empty inputs.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return None;
    }

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(y, p)| (y - p).powi(2)).sum();

    if ss_tot == 0.0 {
        return Some(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Some(1.0 - ss_res / ss_tot)
}

/// Mean absolute error.
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return None;
    }
    let total: f64 = y_true.iter().zip(y_pred).map(|(y, p)| (y - p).abs()).sum();
    Some(total / y_true.len() as f64)
}
