// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Metric engine for evaluating model outputs stored as CSV
//!
//! This crate provides:
//! - CSV loading of ground truth next to predictions (multiclass, binary, regression)
//! - Cross-entropy and binary cross-entropy with an epsilon floor
//! - Confusion matrices, accuracy, precision, recall, F1
//! - AUC-ROC from a fixed threshold-grid sweep with trapezoidal integration
//! - MSE, MAE and MARE for regression outputs
//! - Pluggable best-model ranking across several model files

pub mod accumulator;
pub mod confusion;
pub mod datasets;
pub mod error;
pub mod loss;
pub mod metrics;
pub mod numeric;
pub mod pipeline;
pub mod ranking;
pub mod regression;
pub mod roc;

pub use accumulator::{accumulate_all, MetricAccumulator, MetricSettings};
pub use confusion::{BinaryConfusion, ConfusionMatrix};
pub use datasets::{BinarySample, Dataset, EvaluationMode, Label, LoadOptions, MulticlassSample, RegressionSample};
pub use error::{EvalError, Result};
pub use metrics::{ConfusionSummary, EvaluationMetrics, Metric};
pub use numeric::Epsilon;
pub use pipeline::{EvaluationConfig, EvaluationPipeline, EvaluationResults, ModelOutcome, ModelSource};
pub use ranking::{rank, Direction, Ranking, RankingSummary};
pub use roc::{auc_roc, roc_curve, RocPoint, ThresholdGrid};
