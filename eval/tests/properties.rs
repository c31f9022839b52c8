// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Property tests for the metric engines
//!
//! Checks the invariants every evaluation run must satisfy:
//! - Confusion cells sum to the sample count
//! - Log losses are bounded below by -ln(1 + eps)
//! - AUC-ROC depends only on score ranking within the grid
//! - MSE is zero exactly when every prediction is exact

use model_eval::accumulator::{accumulate_all, BinaryAccumulator, MetricSettings, MulticlassAccumulator};
use model_eval::datasets::{BinarySample, Dataset, Label, MulticlassSample, RegressionSample};
use model_eval::metrics::ConfusionSummary;
use model_eval::roc::{auc_roc, ThresholdGrid};
use proptest::collection::vec;
use proptest::prelude::*;

const EPS: f64 = 1e-9;

// =============================================================================
// Strategy Helpers
// =============================================================================

fn binary_samples(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<BinarySample>> {
    vec((any::<bool>(), 0.0..=1.0f64), len).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(positive, score)| BinarySample {
                label: if positive { Label::Positive } else { Label::Negative },
                score,
            })
            .collect()
    })
}

/// Scores of the form 2k/100, so halving them lands exactly on grid points k/100
fn even_grid_samples(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<(bool, u32)>> {
    vec((any::<bool>(), 0u32..=50), len)
}

fn multiclass_samples(class_count: usize, len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<MulticlassSample>> {
    vec((0..class_count, vec(0.0..1.0f64, class_count)), len).prop_map(|rows| {
        rows.into_iter()
            .map(|(actual_class, raw)| {
                let total: f64 = raw.iter().sum::<f64>() + 1e-12;
                MulticlassSample {
                    actual_class,
                    probabilities: raw.iter().map(|p| p / total).collect(),
                }
            })
            .collect()
    })
}

// =============================================================================
// Confusion Matrix Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_multiclass_confusion_sums_to_sample_count(samples in multiclass_samples(5, 1..200)) {
        let n = samples.len();
        let metrics = accumulate_all(MulticlassAccumulator::new(&MetricSettings::default()), &samples).unwrap();

        match metrics.confusion {
            Some(ConfusionSummary::Multiclass(cm)) => prop_assert_eq!(cm.total(), n),
            other => prop_assert!(false, "unexpected confusion {:?}", other),
        }
    }

    #[test]
    fn prop_binary_confusion_sums_to_sample_count(samples in binary_samples(1..200)) {
        let n = samples.len();
        let metrics = accumulate_all(BinaryAccumulator::new(&MetricSettings::default()), &samples).unwrap();

        prop_assert_eq!(metrics.support, n);
        match metrics.confusion {
            Some(ConfusionSummary::Binary(cm)) => {
                prop_assert_eq!(cm.tp + cm.fp + cm.tn + cm.fn_, n);
                let positives = samples.iter().filter(|s| s.label.is_positive()).count();
                prop_assert_eq!(cm.positives(), positives);
            }
            other => prop_assert!(false, "unexpected confusion {:?}", other),
        }
    }

    #[test]
    fn prop_binary_rates_bounded(samples in binary_samples(1..200)) {
        let metrics = accumulate_all(BinaryAccumulator::new(&MetricSettings::default()), &samples).unwrap();
        for value in [metrics.accuracy, metrics.precision, metrics.recall, metrics.f1_score, metrics.auc_roc] {
            let v = value.unwrap();
            prop_assert!((0.0..=1.0 + 1e-12).contains(&v), "rate {} out of [0, 1]", v);
        }
    }
}

// =============================================================================
// Loss Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_cross_entropy_bounded_below(samples in multiclass_samples(5, 1..100)) {
        let metrics = accumulate_all(MulticlassAccumulator::new(&MetricSettings::default()), &samples).unwrap();
        let loss = metrics.loss.unwrap();
        prop_assert!(loss.is_finite());
        prop_assert!(loss >= -(1.0 + EPS).ln() - 1e-15);
    }

    #[test]
    fn prop_bce_bounded_below(samples in binary_samples(1..100)) {
        let metrics = accumulate_all(BinaryAccumulator::new(&MetricSettings::default()), &samples).unwrap();
        let loss = metrics.loss.unwrap();
        prop_assert!(loss.is_finite());
        prop_assert!(loss >= -(1.0 + EPS).ln() - 1e-15);
    }
}

// =============================================================================
// AUC-ROC Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_auc_invariant_to_halving_scores(pairs in even_grid_samples(1..100)) {
        let original: Vec<BinarySample> = pairs
            .iter()
            .map(|&(positive, k)| BinarySample {
                label: if positive { Label::Positive } else { Label::Negative },
                score: (2 * k) as f64 / 100.0,
            })
            .collect();
        let halved: Vec<BinarySample> = original
            .iter()
            .map(|s| BinarySample { label: s.label, score: s.score * 0.5 })
            .collect();

        let grid = ThresholdGrid::default();
        let a = auc_roc(&original, &grid);
        let b = auc_roc(&halved, &grid);
        prop_assert!((a - b).abs() < 1e-12, "AUC {} != {}", a, b);
    }

    #[test]
    fn prop_auc_order_independent(samples in binary_samples(1..100)) {
        let grid = ThresholdGrid::default();
        let mut reversed = samples.clone();
        reversed.reverse();
        prop_assert_eq!(auc_roc(&samples, &grid), auc_roc(&reversed, &grid));
    }

    #[test]
    fn prop_perfect_separator_auc_is_one(labels in vec(any::<bool>(), 2..100)) {
        prop_assume!(labels.iter().any(|&l| l) && labels.iter().any(|&l| !l));
        let samples: Vec<BinarySample> = labels
            .iter()
            .map(|&positive| BinarySample {
                label: if positive { Label::Positive } else { Label::Negative },
                score: if positive { 1.0 } else { 0.0 },
            })
            .collect();
        let auc = auc_roc(&samples, &ThresholdGrid::default());
        prop_assert!((auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prop_constant_half_scores_auc_is_half(labels in vec(any::<bool>(), 2..100)) {
        prop_assume!(labels.iter().any(|&l| l) && labels.iter().any(|&l| !l));
        let samples: Vec<BinarySample> = labels
            .iter()
            .map(|&positive| BinarySample {
                label: if positive { Label::Positive } else { Label::Negative },
                score: 0.5,
            })
            .collect();
        let auc = auc_roc(&samples, &ThresholdGrid::default());
        prop_assert!((auc - 0.5).abs() < 1e-12);
    }
}

// =============================================================================
// Regression Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_mse_non_negative(pairs in vec((-1e3..1e3f64, -1e3..1e3f64), 1..100)) {
        let samples: Vec<RegressionSample> = pairs
            .iter()
            .map(|&(actual, predicted)| RegressionSample { actual, predicted })
            .collect();
        let metrics = MetricSettings::default().evaluate(&Dataset::Regression(samples)).unwrap();
        prop_assert!(metrics.mse.unwrap() >= 0.0);
        prop_assert!(metrics.mae.unwrap() >= 0.0);
        prop_assert!(metrics.mare.unwrap() >= 0.0);
    }

    #[test]
    fn prop_mse_zero_iff_exact(actuals in vec(-1e3..1e3f64, 1..100), perturb in any::<bool>()) {
        let mut samples: Vec<RegressionSample> = actuals
            .iter()
            .map(|&a| RegressionSample { actual: a, predicted: a })
            .collect();
        if perturb {
            samples[0].predicted += 1.0;
        }
        let mse = MetricSettings::default()
            .evaluate(&Dataset::Regression(samples))
            .unwrap()
            .mse
            .unwrap();
        prop_assert_eq!(mse == 0.0, !perturb);
    }
}
