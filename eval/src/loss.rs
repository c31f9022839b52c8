// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Log-loss terms, mean-reduced over the dataset
//!
//! The epsilon floor is added to the probability before the logarithm so a
//! zero probability yields a large finite penalty instead of infinity.

use crate::datasets::Label;
use crate::error::{EvalError, Result};
use crate::numeric::{guarded_ln, RunningMean};

/// Multiclass cross-entropy: mean of `-ln(p[actual] + eps)`
#[derive(Debug, Clone)]
pub struct CrossEntropy {
    eps: f64,
    terms: RunningMean,
}

impl CrossEntropy {
    pub fn new(eps: f64) -> Self {
        Self {
            eps,
            terms: RunningMean::default(),
        }
    }

    pub fn observe(&mut self, probabilities: &[f64], actual_class: usize) -> Result<()> {
        let p = probabilities
            .get(actual_class)
            .copied()
            .ok_or(EvalError::ClassOutOfRange {
                row: self.terms.count() + 1,
                class: actual_class as i64 + 1,
                class_count: probabilities.len(),
            })?;
        self.terms.push(-guarded_ln(p, self.eps));
        Ok(())
    }

    pub fn value(&self) -> Result<f64> {
        self.terms.mean()
    }
}

/// Binary cross-entropy: mean of `-(y ln(p + eps) + (1 - y) ln(1 - p + eps))`
#[derive(Debug, Clone)]
pub struct BinaryCrossEntropy {
    eps: f64,
    terms: RunningMean,
}

impl BinaryCrossEntropy {
    pub fn new(eps: f64) -> Self {
        Self {
            eps,
            terms: RunningMean::default(),
        }
    }

    pub fn observe(&mut self, label: Label, score: f64) {
        let y = f64::from(label.to_binary());
        let term = y * guarded_ln(score, self.eps) + (1.0 - y) * guarded_ln(1.0 - score, self.eps);
        self.terms.push(-term);
    }

    pub fn value(&self) -> Result<f64> {
        self.terms.mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_entropy_single_row() {
        let mut ce = CrossEntropy::new(1e-9);
        ce.observe(&[0.7, 0.1, 0.1, 0.05, 0.05], 0).unwrap();
        let expected = -(0.7_f64 + 1e-9).ln();
        assert!((ce.value().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_cross_entropy_zero_probability_is_finite() {
        let mut ce = CrossEntropy::new(1e-9);
        ce.observe(&[1.0, 0.0], 1).unwrap();
        let loss = ce.value().unwrap();
        assert!(loss.is_finite());
        assert!((loss - -(1e-9_f64).ln()).abs() < 1e-9);
    }

    #[test]
    fn test_cross_entropy_mean_reduction() {
        let mut ce = CrossEntropy::new(1e-9);
        ce.observe(&[0.5, 0.5], 0).unwrap();
        ce.observe(&[0.25, 0.75], 0).unwrap();
        let expected = (-(0.5_f64 + 1e-9).ln() - (0.25_f64 + 1e-9).ln()) / 2.0;
        assert!((ce.value().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_cross_entropy_class_out_of_range() {
        let mut ce = CrossEntropy::new(1e-9);
        assert!(ce.observe(&[0.5, 0.5], 2).is_err());
    }

    #[test]
    fn test_empty_loss_is_error() {
        assert!(matches!(CrossEntropy::new(1e-9).value(), Err(EvalError::EmptyDataset)));
        assert!(matches!(BinaryCrossEntropy::new(1e-9).value(), Err(EvalError::EmptyDataset)));
    }

    #[test]
    fn test_binary_cross_entropy() {
        let mut bce = BinaryCrossEntropy::new(1e-9);
        bce.observe(Label::Positive, 0.9);
        bce.observe(Label::Negative, 0.2);

        let expected = (-(0.9_f64 + 1e-9).ln() - (0.8_f64 + 1e-9).ln()) / 2.0;
        assert!((bce.value().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_binary_cross_entropy_confident_mistake_is_bounded() {
        let mut bce = BinaryCrossEntropy::new(1e-9);
        bce.observe(Label::Positive, 0.0);
        let loss = bce.value().unwrap();
        assert!(loss.is_finite());
        assert!(loss > 20.0);
    }
}
