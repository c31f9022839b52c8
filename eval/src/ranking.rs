// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Best-model selection
//!
//! A `Ranking` turns a file's metrics into a comparable key and says which
//! direction is better. Files that failed to evaluate, or that lack the
//! ranked metric, get the worst possible key and can never win. Ties keep
//! the earlier file.

use crate::metrics::{EvaluationMetrics, Metric};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// Sentinel assigned to disqualified entries
    pub fn worst_value(&self) -> f64 {
        match self {
            Direction::Maximize => f64::NEG_INFINITY,
            Direction::Minimize => f64::MAX,
        }
    }

    /// Strict improvement only
    pub fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }
}

/// Pluggable ranking function over a result's scalar metrics
pub trait Ranking {
    fn name(&self) -> String;

    fn direction(&self) -> Direction;

    fn key(&self, metrics: &EvaluationMetrics) -> Option<f64>;
}

impl Metric {
    /// Losses and errors are minimized, everything else maximized
    pub fn direction(&self) -> Direction {
        match self {
            Metric::Loss | Metric::Mse | Metric::Mae | Metric::Mare => Direction::Minimize,
            Metric::Accuracy | Metric::Precision | Metric::Recall | Metric::F1 | Metric::AucRoc => {
                Direction::Maximize
            }
        }
    }
}

impl Ranking for Metric {
    fn name(&self) -> String {
        Metric::name(self).to_string()
    }

    fn direction(&self) -> Direction {
        Metric::direction(self)
    }

    fn key(&self, metrics: &EvaluationMetrics) -> Option<f64> {
        metrics.get(*self).filter(|v| !v.is_nan())
    }
}

/// One file's position in the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    /// Ranking key, or the direction's worst value when disqualified
    pub value: f64,
    pub disqualified: bool,
}

/// Outcome of ranking a set of files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    pub metric: String,
    pub direction: Direction,
    /// Entries in input order
    pub entries: Vec<RankedEntry>,
    pub best: Option<RankedEntry>,
}

/// Rank named results; `None` marks a file whose evaluation failed
pub fn rank<'a, I>(ranking: &dyn Ranking, results: I) -> RankingSummary
where
    I: IntoIterator<Item = (&'a str, Option<&'a EvaluationMetrics>)>,
{
    let direction = ranking.direction();
    let mut best: Option<RankedEntry> = None;

    let entries: Vec<RankedEntry> = results
        .into_iter()
        .map(|(name, metrics)| {
            let key = metrics.and_then(|m| ranking.key(m));
            let entry = RankedEntry {
                name: name.to_string(),
                value: key.unwrap_or_else(|| direction.worst_value()),
                disqualified: key.is_none(),
            };

            if !entry.disqualified {
                let improves = best
                    .as_ref()
                    .map_or(true, |b| direction.is_better(entry.value, b.value));
                if improves {
                    best = Some(entry.clone());
                }
            }
            entry
        })
        .collect();

    RankingSummary {
        metric: ranking.name(),
        direction,
        entries,
        best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::RegressionSummary;

    fn regression(mse: f64) -> EvaluationMetrics {
        EvaluationMetrics::regression(10, RegressionSummary { mse, mae: mse.sqrt(), mare: 0.1 })
    }

    #[test]
    fn test_minimize_mse_skips_failed_file() {
        let a = regression(2.0);
        let c = regression(1.5);
        let summary = rank(
            &Metric::Mse,
            vec![("model_1.csv", Some(&a)), ("model_2.csv", None), ("model_3.csv", Some(&c))],
        );

        assert_eq!(summary.best.as_ref().map(|b| b.name.as_str()), Some("model_3.csv"));
        assert!(summary.entries[1].disqualified);
        assert_eq!(summary.entries[1].value, f64::MAX);
        assert_eq!(summary.direction, Direction::Minimize);
    }

    #[test]
    fn test_ties_keep_first() {
        let a = regression(1.0);
        let b = regression(1.0);
        let summary = rank(&Metric::Mse, vec![("first", Some(&a)), ("second", Some(&b))]);
        assert_eq!(summary.best.unwrap().name, "first");
    }

    #[test]
    fn test_missing_metric_disqualifies() {
        let a = regression(1.0);
        let summary = rank(&Metric::AucRoc, vec![("reg", Some(&a))]);
        assert!(summary.best.is_none());
        assert_eq!(summary.entries[0].value, f64::NEG_INFINITY);
    }

    #[test]
    fn test_all_failed_has_no_best() {
        let summary = rank(&Metric::Mse, vec![("a", None), ("b", None)]);
        assert!(summary.best.is_none());
        assert!(summary.entries.iter().all(|e| e.disqualified));
    }

    struct LowestMare;

    impl Ranking for LowestMare {
        fn name(&self) -> String {
            "lowest-mare".to_string()
        }

        fn direction(&self) -> Direction {
            Direction::Minimize
        }

        fn key(&self, metrics: &EvaluationMetrics) -> Option<f64> {
            metrics.mare
        }
    }

    #[test]
    fn test_custom_ranking() {
        let mut a = regression(1.0);
        a.mare = Some(0.5);
        let b = regression(3.0);
        let summary = rank(&LowestMare, vec![("a", Some(&a)), ("b", Some(&b))]);
        assert_eq!(summary.metric, "lowest-mare");
        assert_eq!(summary.best.unwrap().name, "b");
    }

    #[test]
    fn test_metric_directions() {
        assert_eq!(Metric::AucRoc.direction(), Direction::Maximize);
        assert_eq!(Metric::Loss.direction(), Direction::Minimize);
        assert!(Direction::Maximize.is_better(0.9, 0.8));
        assert!(!Direction::Minimize.is_better(0.9, 0.9));
    }
}
