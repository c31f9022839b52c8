// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Numeric guards shared by the metric engines

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// Floor added to a probability before taking its logarithm
pub const DEFAULT_LOG_EPSILON: f64 = 1e-9;

/// Floor added to `|actual|` in the relative-error denominator
pub const DEFAULT_RELATIVE_EPSILON: f64 = 1e-10;

/// Epsilon constants used by the loss and regression engines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Epsilon {
    /// Added to probabilities before `ln` (keeps the log finite at p = 0)
    pub log: f64,
    /// Added to `|actual|` when dividing for MARE
    pub relative: f64,
}

impl Default for Epsilon {
    fn default() -> Self {
        Self {
            log: DEFAULT_LOG_EPSILON,
            relative: DEFAULT_RELATIVE_EPSILON,
        }
    }
}

impl Epsilon {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("log", self.log), ("relative", self.relative)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EvalError::InvalidConfig(format!(
                    "epsilon.{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// `ln(p + eps)`; the epsilon is applied to the probability, not the result
#[inline]
pub fn guarded_ln(p: f64, eps: f64) -> f64 {
    (p + eps).ln()
}

/// `num / den`, or 0.0 when the denominator is zero
#[inline]
pub fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Running sum with a sample count, reduced to an arithmetic mean
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean over pushed values. An empty mean is an error, never NaN.
    pub fn mean(&self) -> Result<f64> {
        if self.count == 0 {
            return Err(EvalError::EmptyDataset);
        }
        Ok(self.sum / self.count as f64)
    }
}
