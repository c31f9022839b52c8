// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Metric accumulators
//!
//! One trait covers the three evaluation modes. Each accumulator owns the
//! capabilities its mode needs (confusion counts, a loss term, AUC input,
//! regression sums) and consumes samples one at a time. Only the binary
//! accumulator keeps samples around, because the ROC sweep re-scans all of
//! them for every threshold.

use crate::confusion::{BinaryConfusion, ConfusionMatrix};
use crate::datasets::{BinarySample, Dataset, MulticlassSample, RegressionSample};
use crate::error::{EvalError, Result};
use crate::loss::{BinaryCrossEntropy, CrossEntropy};
use crate::metrics::EvaluationMetrics;
use crate::numeric::Epsilon;
use crate::regression::RegressionErrors;
use crate::roc::{auc_roc, ThresholdGrid};

/// Consumes samples and produces the metrics of one evaluation run
pub trait MetricAccumulator {
    type Sample;

    fn observe(&mut self, sample: &Self::Sample) -> Result<()>;

    fn finish(self) -> Result<EvaluationMetrics>;
}

/// Feed every sample through `accumulator`; the first bad sample aborts the run
pub fn accumulate_all<A: MetricAccumulator>(mut accumulator: A, samples: &[A::Sample]) -> Result<EvaluationMetrics> {
    for sample in samples {
        accumulator.observe(sample)?;
    }
    accumulator.finish()
}

/// Parameters shared by all accumulators
#[derive(Debug, Clone, Copy)]
pub struct MetricSettings {
    pub class_count: usize,
    /// Fixed cut used for the binary confusion block, separate from the ROC sweep
    pub decision_threshold: f64,
    pub grid: ThresholdGrid,
    pub epsilon: Epsilon,
}

impl Default for MetricSettings {
    fn default() -> Self {
        Self {
            class_count: 5,
            decision_threshold: 0.5,
            grid: ThresholdGrid::default(),
            epsilon: Epsilon::default(),
        }
    }
}

impl MetricSettings {
    /// Evaluate a loaded dataset with the accumulator matching its mode
    pub fn evaluate(&self, dataset: &Dataset) -> Result<EvaluationMetrics> {
        match dataset {
            Dataset::Multiclass(samples) => accumulate_all(MulticlassAccumulator::new(self), samples),
            Dataset::Binary(samples) => accumulate_all(BinaryAccumulator::new(self), samples),
            Dataset::Regression(samples) => accumulate_all(RegressionAccumulator::new(self), samples),
        }
    }
}

/// Cross-entropy and a K×K confusion matrix
#[derive(Debug, Clone)]
pub struct MulticlassAccumulator {
    class_count: usize,
    confusion: ConfusionMatrix,
    loss: CrossEntropy,
}

impl MulticlassAccumulator {
    pub fn new(settings: &MetricSettings) -> Self {
        Self {
            class_count: settings.class_count,
            confusion: ConfusionMatrix::new(settings.class_count),
            loss: CrossEntropy::new(settings.epsilon.log),
        }
    }
}

impl MetricAccumulator for MulticlassAccumulator {
    type Sample = MulticlassSample;

    fn observe(&mut self, sample: &MulticlassSample) -> Result<()> {
        let row = self.confusion.total() + 1;
        if sample.probabilities.len() != self.class_count {
            return Err(EvalError::ProbabilityCount {
                row,
                expected: self.class_count,
                found: sample.probabilities.len(),
            });
        }
        if sample.actual_class >= self.class_count {
            return Err(EvalError::ClassOutOfRange {
                row,
                class: sample.actual_class as i64 + 1,
                class_count: self.class_count,
            });
        }

        self.confusion.accumulate(sample.actual_class, sample.predicted_class())?;
        self.loss.observe(&sample.probabilities, sample.actual_class)
    }

    fn finish(self) -> Result<EvaluationMetrics> {
        let loss = self.loss.value()?;
        Ok(EvaluationMetrics::multiclass(loss, self.confusion))
    }
}

/// BCE, confusion counts at the decision threshold, and AUC-ROC over the threshold grid
#[derive(Debug, Clone)]
pub struct BinaryAccumulator {
    threshold: f64,
    grid: ThresholdGrid,
    confusion: BinaryConfusion,
    loss: BinaryCrossEntropy,
    samples: Vec<BinarySample>,
}

impl BinaryAccumulator {
    pub fn new(settings: &MetricSettings) -> Self {
        Self {
            threshold: settings.decision_threshold,
            grid: settings.grid,
            confusion: BinaryConfusion::default(),
            loss: BinaryCrossEntropy::new(settings.epsilon.log),
            samples: Vec::new(),
        }
    }
}

impl MetricAccumulator for BinaryAccumulator {
    type Sample = BinarySample;

    fn observe(&mut self, sample: &BinarySample) -> Result<()> {
        if !sample.score.is_finite() || !(0.0..=1.0).contains(&sample.score) {
            return Err(EvalError::InvalidProbability {
                row: self.samples.len() + 1,
                value: sample.score,
            });
        }
        self.confusion.accumulate(sample.label, sample.score, self.threshold);
        self.loss.observe(sample.label, sample.score);
        self.samples.push(*sample);
        Ok(())
    }

    fn finish(self) -> Result<EvaluationMetrics> {
        let loss = self.loss.value()?;
        let auc = auc_roc(&self.samples, &self.grid);
        Ok(EvaluationMetrics::binary(loss, self.confusion, auc))
    }
}

/// MSE, MAE and MARE
#[derive(Debug, Clone)]
pub struct RegressionAccumulator {
    errors: RegressionErrors,
}

impl RegressionAccumulator {
    pub fn new(settings: &MetricSettings) -> Self {
        Self {
            errors: RegressionErrors::new(settings.epsilon.relative),
        }
    }
}

impl MetricAccumulator for RegressionAccumulator {
    type Sample = RegressionSample;

    fn observe(&mut self, sample: &RegressionSample) -> Result<()> {
        self.errors.observe(sample.actual, sample.predicted);
        Ok(())
    }

    fn finish(self) -> Result<EvaluationMetrics> {
        let summary = self.errors.summary()?;
        Ok(EvaluationMetrics::regression(self.errors.count(), summary))
    }
}
