// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Regression error sums: MSE, MAE and MARE over (actual, predicted) pairs

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// Running sums for the three regression errors
#[derive(Debug, Clone)]
pub struct RegressionErrors {
    eps: f64,
    squared: f64,
    absolute: f64,
    relative: f64,
    count: usize,
}

/// Final regression errors, each a mean over the sample count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionSummary {
    pub mse: f64,
    pub mae: f64,
    pub mare: f64,
}

impl RegressionErrors {
    /// `eps` is added to `|actual|` in the MARE denominator
    pub fn new(eps: f64) -> Self {
        Self {
            eps,
            squared: 0.0,
            absolute: 0.0,
            relative: 0.0,
            count: 0,
        }
    }

    pub fn observe(&mut self, actual: f64, predicted: f64) {
        let error = actual - predicted;
        self.squared += error * error;
        self.absolute += error.abs();
        self.relative += error.abs() / (actual.abs() + self.eps);
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn summary(&self) -> Result<RegressionSummary> {
        if self.count == 0 {
            return Err(EvalError::EmptyDataset);
        }
        let n = self.count as f64;
        Ok(RegressionSummary {
            mse: self.squared / n,
            mae: self.absolute / n,
            mare: self.relative / n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pair_contributions() {
        let mut errors = RegressionErrors::new(1e-10);
        errors.observe(10.0, 8.0);
        let s = errors.summary().unwrap();

        assert!((s.mse - 4.0).abs() < 1e-12);
        assert!((s.mae - 2.0).abs() < 1e-12);
        assert!((s.mare - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_means_over_count() {
        let mut errors = RegressionErrors::new(1e-10);
        errors.observe(10.0, 8.0);
        errors.observe(-4.0, -5.0);
        let s = errors.summary().unwrap();

        assert!((s.mse - 2.5).abs() < 1e-12);
        assert!((s.mae - 1.5).abs() < 1e-12);
        assert!((s.mare - (0.2 + 0.25) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_actual_is_guarded() {
        let mut errors = RegressionErrors::new(1e-10);
        errors.observe(0.0, 1e-3);
        let s = errors.summary().unwrap();
        assert!(s.mare.is_finite());
        assert!((s.mare - 1e7).abs() < 1.0);
    }

    #[test]
    fn test_exact_predictions() {
        let mut errors = RegressionErrors::new(1e-10);
        errors.observe(3.5, 3.5);
        errors.observe(-1.0, -1.0);
        let s = errors.summary().unwrap();
        assert_eq!(s.mse, 0.0);
        assert_eq!(s.mae, 0.0);
        assert_eq!(s.mare, 0.0);
    }

    #[test]
    fn test_empty_is_error() {
        let errors = RegressionErrors::new(1e-10);
        assert_eq!(errors.count(), 0);
        assert!(matches!(errors.summary(), Err(EvalError::EmptyDataset)));
    }
}
