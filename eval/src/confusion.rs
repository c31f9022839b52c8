// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Confusion matrices
//!
//! - `ConfusionMatrix`: K×K counts, `cells[predicted][actual]`
//! - `BinaryConfusion`: the two-class case as named TP/FP/TN/FN counts
//!
//! Every sample lands in exactly one cell, so the cell total always
//! equals the number of samples accumulated.

use crate::datasets::Label;
use crate::error::{EvalError, Result};
use crate::numeric::ratio_or_zero;
use serde::{Deserialize, Serialize};

/// Multiclass confusion matrix with predicted classes as rows and actual classes as columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    class_count: usize,
    cells: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(class_count: usize) -> Self {
        Self {
            class_count,
            cells: vec![vec![0; class_count]; class_count],
        }
    }

    /// Increment the `(predicted, actual)` cell. Out-of-range classes are rejected, never clamped.
    pub fn accumulate(&mut self, actual: usize, predicted: usize) -> Result<()> {
        for class in [actual, predicted] {
            if class >= self.class_count {
                return Err(EvalError::ClassOutOfRange {
                    row: self.total() + 1,
                    class: class as i64 + 1,
                    class_count: self.class_count,
                });
            }
        }
        self.cells[predicted][actual] += 1;
        Ok(())
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    pub fn get(&self, predicted: usize, actual: usize) -> usize {
        self.cells
            .get(predicted)
            .and_then(|row| row.get(actual))
            .copied()
            .unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.cells
    }

    pub fn total(&self) -> usize {
        self.cells.iter().flatten().sum()
    }

    /// Share of samples on the diagonal
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.class_count).map(|i| self.cells[i][i]).sum();
        ratio_or_zero(correct as f64, self.total() as f64)
    }

    /// Text grid: header `y=1 .. y=K`, one `y^=i` row per predicted class
    pub fn format(&self) -> String {
        let mut out = String::from("\t");
        for actual in 1..=self.class_count {
            out.push_str(&format!("\ty={}", actual));
        }
        out.push('\n');
        for (predicted, row) in self.cells.iter().enumerate() {
            out.push_str(&format!("y^={}", predicted + 1));
            for count in row {
                out.push_str(&format!("\t{}", count));
            }
            out.push('\n');
        }
        out
    }
}

/// Two-class confusion counts at a fixed decision threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryConfusion {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl BinaryConfusion {
    /// Classify `score` against `threshold` (positive iff `score >= threshold`) and count it
    pub fn accumulate(&mut self, label: Label, score: f64, threshold: f64) {
        let predicted_positive = score >= threshold;
        match (label, predicted_positive) {
            (Label::Positive, true) => self.tp += 1,
            (Label::Positive, false) => self.fn_ += 1,
            (Label::Negative, true) => self.fp += 1,
            (Label::Negative, false) => self.tn += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn positives(&self) -> usize {
        self.tp + self.fn_
    }

    pub fn negatives(&self) -> usize {
        self.fp + self.tn
    }

    /// Accuracy: (TP + TN) / Total
    pub fn accuracy(&self) -> f64 {
        ratio_or_zero((self.tp + self.tn) as f64, self.total() as f64)
    }

    /// Precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio_or_zero(self.tp as f64, (self.tp + self.fp) as f64)
    }

    /// Recall: TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio_or_zero(self.tp as f64, (self.tp + self.fn_) as f64)
    }

    /// Specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio_or_zero(self.tn as f64, (self.tn + self.fp) as f64)
    }

    /// F1 Score: 2 * (Precision * Recall) / (Precision + Recall)
    pub fn f1_score(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        ratio_or_zero(2.0 * precision * recall, precision + recall)
    }

    pub fn balanced_accuracy(&self) -> f64 {
        (self.recall() + self.specificity()) / 2.0
    }
}
