// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! ROC sweep over a fixed threshold grid and trapezoidal AUC
//!
//! The grid is not derived from the data: with resolution `N` the
//! thresholds are `0/N, 1/N, ..., N/N`. Every threshold re-scans the whole
//! sample set, so the cost is O((N + 1) · n) and the result is independent
//! of sample order.

use crate::confusion::BinaryConfusion;
use crate::datasets::BinarySample;
use crate::error::{EvalError, Result};
use crate::numeric::ratio_or_zero;
use serde::{Deserialize, Serialize};

/// Default resolution, giving the 101 thresholds 0.00, 0.01, ..., 1.00
pub const DEFAULT_ROC_RESOLUTION: usize = 100;

/// `resolution + 1` equally spaced decision thresholds in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdGrid {
    resolution: usize,
}

impl Default for ThresholdGrid {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_ROC_RESOLUTION,
        }
    }
}

impl ThresholdGrid {
    pub fn new(resolution: usize) -> Result<Self> {
        if resolution == 0 {
            return Err(EvalError::InvalidConfig("roc_resolution must be at least 1".to_string()));
        }
        Ok(Self { resolution })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of thresholds, always `resolution + 1`
    pub fn point_count(&self) -> usize {
        self.resolution + 1
    }

    /// Thresholds in increasing order
    pub fn thresholds(&self) -> impl Iterator<Item = f64> + '_ {
        (0..=self.resolution).map(move |i| i as f64 / self.resolution as f64)
    }
}

/// One operating point of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub tpr: f64,
    pub fpr: f64,
}

/// Sweep the grid and return one point per threshold, in grid order
///
/// TPR is 0 when there are no positives and FPR is 0 when there are no
/// negatives; degenerate datasets are not special-cased beyond that.
pub fn roc_curve(samples: &[BinarySample], grid: &ThresholdGrid) -> Vec<RocPoint> {
    let positives = samples.iter().filter(|s| s.label.is_positive()).count();
    let negatives = samples.len() - positives;

    grid.thresholds()
        .map(|threshold| {
            let mut counts = BinaryConfusion::default();
            for sample in samples {
                counts.accumulate(sample.label, sample.score, threshold);
            }
            RocPoint {
                threshold,
                tpr: ratio_or_zero(counts.tp as f64, positives as f64),
                fpr: ratio_or_zero(counts.fp as f64, negatives as f64),
            }
        })
        .collect()
}

/// Trapezoidal area under consecutive points, using `|ΔFPR|` so traversal direction does not matter
pub fn auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[0].tpr + w[1].tpr) * (w[0].fpr - w[1].fpr).abs() / 2.0)
        .sum()
}

/// AUC-ROC of a sample set at the given grid resolution
pub fn auc_roc(samples: &[BinarySample], grid: &ThresholdGrid) -> f64 {
    auc(&roc_curve(samples, grid))
}
