// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation result for one model file
//!
//! Which fields are populated depends on the mode:
//! - multiclass: cross-entropy loss, accuracy, K×K confusion matrix
//! - binary: BCE loss, accuracy, precision, recall, F1, AUC-ROC, TP/FP/TN/FN
//! - regression: MSE, MAE, MARE

use crate::confusion::{BinaryConfusion, ConfusionMatrix};
use crate::datasets::EvaluationMode;
use crate::error::{EvalError, Result};
use crate::regression::RegressionSummary;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confusion counts in the shape the mode produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConfusionSummary {
    Multiclass(ConfusionMatrix),
    Binary(BinaryConfusion),
}

impl ConfusionSummary {
    pub fn total(&self) -> usize {
        match self {
            ConfusionSummary::Multiclass(cm) => cm.total(),
            ConfusionSummary::Binary(cm) => cm.total(),
        }
    }
}

/// Scalar metrics plus the confusion counts of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mode: EvaluationMode,
    /// Number of samples evaluated
    pub support: usize,
    /// Cross-entropy (multiclass) or binary cross-entropy
    pub loss: Option<f64>,
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
    pub auc_roc: Option<f64>,
    pub mse: Option<f64>,
    pub mae: Option<f64>,
    pub mare: Option<f64>,
    pub confusion: Option<ConfusionSummary>,
}

impl EvaluationMetrics {
    pub fn multiclass(loss: f64, confusion: ConfusionMatrix) -> Self {
        Self {
            support: confusion.total(),
            loss: Some(loss),
            accuracy: Some(confusion.accuracy()),
            confusion: Some(ConfusionSummary::Multiclass(confusion)),
            ..Self::empty(EvaluationMode::Multiclass)
        }
    }

    pub fn binary(loss: f64, confusion: BinaryConfusion, auc_roc: f64) -> Self {
        Self {
            support: confusion.total(),
            loss: Some(loss),
            accuracy: Some(confusion.accuracy()),
            precision: Some(confusion.precision()),
            recall: Some(confusion.recall()),
            f1_score: Some(confusion.f1_score()),
            auc_roc: Some(auc_roc),
            confusion: Some(ConfusionSummary::Binary(confusion)),
            ..Self::empty(EvaluationMode::Binary)
        }
    }

    pub fn regression(support: usize, errors: RegressionSummary) -> Self {
        Self {
            support,
            mse: Some(errors.mse),
            mae: Some(errors.mae),
            mare: Some(errors.mare),
            ..Self::empty(EvaluationMode::Regression)
        }
    }

    fn empty(mode: EvaluationMode) -> Self {
        Self {
            mode,
            support: 0,
            loss: None,
            accuracy: None,
            precision: None,
            recall: None,
            f1_score: None,
            auc_roc: None,
            mse: None,
            mae: None,
            mare: None,
            confusion: None,
        }
    }

    /// Look up a scalar metric by name; `None` if this mode does not produce it
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Loss => self.loss,
            Metric::Accuracy => self.accuracy,
            Metric::Precision => self.precision,
            Metric::Recall => self.recall,
            Metric::F1 => self.f1_score,
            Metric::AucRoc => self.auc_roc,
            Metric::Mse => self.mse,
            Metric::Mae => self.mae,
            Metric::Mare => self.mare,
        }
    }

    /// Plain-text report in the layout of the console evaluators
    pub fn format(&self) -> String {
        let mut output = String::new();

        match self.mode {
            EvaluationMode::Multiclass => {
                if let Some(loss) = self.loss {
                    output.push_str(&format!("CE ={:.7}\n", loss));
                }
                if let Some(ConfusionSummary::Multiclass(ref cm)) = self.confusion {
                    output.push_str("Confusion matrix\n");
                    output.push_str(&cm.format());
                }
            }
            EvaluationMode::Binary => {
                if let Some(loss) = self.loss {
                    output.push_str(&format!("BCE: {:.7}\n", loss));
                }
                if let Some(ConfusionSummary::Binary(ref cm)) = self.confusion {
                    output.push_str(&format!(
                        "Confusion Matrix: TP={} FP={} TN={} FN={}\n",
                        cm.tp, cm.fp, cm.tn, cm.fn_
                    ));
                }
                push_metric(&mut output, "Accuracy", self.accuracy, 4);
                push_metric(&mut output, "Precision", self.precision, 8);
                push_metric(&mut output, "Recall", self.recall, 8);
                push_metric(&mut output, "F1 Score", self.f1_score, 8);
                push_metric(&mut output, "AUC-ROC", self.auc_roc, 8);
            }
            EvaluationMode::Regression => {
                push_metric(&mut output, "MSE", self.mse, 6);
                push_metric(&mut output, "MAE", self.mae, 6);
                push_metric(&mut output, "MARE", self.mare, 9);
            }
        }

        output
    }
}

fn push_metric(output: &mut String, name: &str, value: Option<f64>, precision: usize) {
    if let Some(v) = value {
        output.push_str(&format!("{}: {:.*}\n", name, precision, v));
    }
}

/// Names of the scalar metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Loss,
    Accuracy,
    Precision,
    Recall,
    F1,
    AucRoc,
    Mse,
    Mae,
    Mare,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Loss,
        Metric::Accuracy,
        Metric::Precision,
        Metric::Recall,
        Metric::F1,
        Metric::AucRoc,
        Metric::Mse,
        Metric::Mae,
        Metric::Mare,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Loss => "loss",
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::F1 => "f1",
            Metric::AucRoc => "auc_roc",
            Metric::Mse => "mse",
            Metric::Mae => "mae",
            Metric::Mare => "mare",
        }
    }

    /// Metric each mode ranks models by unless told otherwise
    pub fn default_for(mode: EvaluationMode) -> Self {
        match mode {
            EvaluationMode::Multiclass => Metric::Loss,
            EvaluationMode::Binary => Metric::AucRoc,
            EvaluationMode::Regression => Metric::Mse,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "ce" | "bce" | "cross_entropy" => return Ok(Metric::Loss),
            "auc" => return Ok(Metric::AucRoc),
            "f1_score" => return Ok(Metric::F1),
            _ => {}
        }
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == normalized)
            .ok_or_else(|| EvalError::InvalidConfig(format!("unknown metric '{}'", s)))
    }
}
