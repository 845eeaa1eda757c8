//! Per-column min-max scaling.
//!
//! ```text
//! scaled = (x - min) / range        range = max - min (1 when max == min)
//! x      = scaled * range + min
//! ```
//!
//! Bounds are learned once with `fit` (training partition only) and then
//! applied unchanged; there is no refit at inference time.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// A fitted min-max scaler. One `(min, range)` pair per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Vec<f64>,
    ranges: Vec<f64>,
}

impl MinMaxScaler {
    /// Learn per-column bounds from `data` (rows = samples).
    pub fn fit(data: &DMatrix<f64>) -> Result<Self, ScoreError> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(ScoreError::TrainingDataInvalid(
                "Cannot fit a scaler on an empty matrix.".to_string(),
            ));
        }

        let mut mins = Vec::with_capacity(data.ncols());
        let mut ranges = Vec::with_capacity(data.ncols());
        for col in data.column_iter() {
            if col.iter().any(|v| !v.is_finite()) {
                return Err(ScoreError::TrainingDataInvalid(
                    "Non-finite value in scaler input.".to_string(),
                ));
            }
            let lo = col.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = hi - lo;
            mins.push(lo);
            ranges.push(if range > 0.0 { range } else { 1.0 });
        }

        Ok(Self { mins, ranges })
    }

    /// Fit a single-column scaler on a target vector.
    pub fn fit_vector(values: &DVector<f64>) -> Result<Self, ScoreError> {
        Self::fit(&DMatrix::from_column_slice(values.len(), 1, values.as_slice()))
    }

    pub fn n_features(&self) -> usize {
        self.mins.len()
    }

    /// Learned `[min, max]` of each column.
    pub fn bounds(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mins.iter().zip(&self.ranges).map(|(&lo, &r)| (lo, lo + r))
    }

    pub fn transform(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>, ScoreError> {
        self.check_width(data.ncols())?;
        Ok(DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| {
            (data[(i, j)] - self.mins[j]) / self.ranges[j]
        }))
    }

    pub fn inverse_transform(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>, ScoreError> {
        self.check_width(data.ncols())?;
        Ok(DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| {
            data[(i, j)] * self.ranges[j] + self.mins[j]
        }))
    }

    /// Transform one sample.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, ScoreError> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.mins.iter().zip(&self.ranges))
            .map(|(&x, (&lo, &r))| (x - lo) / r)
            .collect())
    }

    /// Scale a single-column target vector.
    pub fn transform_vector(&self, values: &DVector<f64>) -> Result<DVector<f64>, ScoreError> {
        self.check_width(1)?;
        Ok(values.map(|v| (v - self.mins[0]) / self.ranges[0]))
    }

    /// Invert a single scaled value of a single-column scaler.
    pub fn inverse_scalar(&self, value: f64) -> Result<f64, ScoreError> {
        self.check_width(1)?;
        Ok(value * self.ranges[0] + self.mins[0])
    }

    /// Structural sanity check used when loading persisted state.
    pub fn is_well_formed(&self) -> bool {
        !self.mins.is_empty()
            && self.mins.len() == self.ranges.len()
            && self.mins.iter().all(|v| v.is_finite())
            && self.ranges.iter().all(|r| r.is_finite() && *r > 0.0)
    }

    fn check_width(&self, width: usize) -> Result<(), ScoreError> {
        if width != self.n_features() {
            return Err(ScoreError::ModelStateMismatch(format!(
                "Scaler was fit on {} feature(s) but received {width}.",
                self.n_features()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn maps_training_bounds_to_unit_interval() {
        let x = DMatrix::from_row_slice(3, 2, &[300.0, 500.0, 600.0, 700.0, 900.0, 850.0]);
        let s = MinMaxScaler::fit(&x).unwrap();
        let t = s.transform(&x).unwrap();
        assert_eq!(t[(0, 0)], 0.0);
        assert_eq!(t[(2, 0)], 1.0);
        assert!((t[(1, 0)] - 0.5).abs() < 1e-12);
        assert_eq!(t[(0, 1)], 0.0);
        assert_eq!(t[(2, 1)], 1.0);
    }

    #[test]
    fn constant_column_uses_unit_range() {
        let x = DMatrix::from_row_slice(2, 1, &[700.0, 700.0]);
        let s = MinMaxScaler::fit(&x).unwrap();
        assert_eq!(s.transform_row(&[700.0]).unwrap(), vec![0.0]);
        assert_eq!(s.transform_row(&[701.0]).unwrap(), vec![1.0]);
        assert!(s.is_well_formed());
    }

    #[test]
    fn width_mismatch_is_a_state_mismatch() {
        let x = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let s = MinMaxScaler::fit(&x).unwrap();
        assert!(matches!(s.transform_row(&[1.0, 2.0]), Err(ScoreError::ModelStateMismatch(_))));
        assert!(matches!(s.inverse_scalar(0.5), Err(ScoreError::ModelStateMismatch(_))));
    }

    #[test]
    fn empty_input_is_rejected() {
        let x = DMatrix::<f64>::zeros(0, 3);
        assert!(MinMaxScaler::fit(&x).is_err());
    }

    proptest! {
        #[test]
        fn feature_round_trip(rows in prop::collection::vec(prop::array::uniform3(300.0f64..900.0), 2..40)) {
            let flat: Vec<f64> = rows.iter().flatten().copied().collect();
            let x = DMatrix::from_row_slice(rows.len(), 3, &flat);
            let s = MinMaxScaler::fit(&x).unwrap();
            let back = s.inverse_transform(&s.transform(&x).unwrap()).unwrap();
            for (a, b) in x.iter().zip(back.iter()) {
                prop_assert!((a - b).abs() < 1e-9);
            }
        }

        #[test]
        fn target_round_trip(values in prop::collection::vec(300.0f64..850.0, 2..40)) {
            let y = DVector::from_vec(values);
            let s = MinMaxScaler::fit_vector(&y).unwrap();
            let scaled = s.transform_vector(&y).unwrap();
            for (orig, z) in y.iter().zip(scaled.iter()) {
                prop_assert!((s.inverse_scalar(*z).unwrap() - orig).abs() < 1e-9);
            }
        }
    }
}
