// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Multi-file evaluation pipeline
//!
//! Orchestrates:
//! - Configuration validation
//! - Loading each model file (or an in-memory dataset)
//! - Metric accumulation per file
//! - Best-model ranking
//! - Results serialization (JSON, markdown, plain text)
//!
//! Each file is evaluated independently. A file that fails to load or
//! evaluate is recorded as failed and never aborts its siblings.

use crate::accumulator::MetricSettings;
use crate::datasets::{Dataset, EvaluationMode, LoadOptions};
use crate::error::{EvalError, Result as EvalResult};
use crate::metrics::{EvaluationMetrics, Metric};
use crate::numeric::Epsilon;
use crate::ranking::{rank, RankingSummary};
use crate::roc::{ThresholdGrid, DEFAULT_ROC_RESOLUTION};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration for the evaluation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub mode: EvaluationMode,
    /// Model output files, evaluated in this order
    pub files: Vec<String>,
    /// Number of classes K in multiclass files
    pub class_count: usize,
    /// Cut for the binary confusion block (positive iff score >= threshold)
    pub decision_threshold: f64,
    /// ROC grid resolution N, giving N + 1 thresholds
    pub roc_resolution: usize,
    pub epsilon: Epsilon,
    /// Metric to rank files by; defaults to the mode's natural metric
    pub ranking: Option<Metric>,
    /// Whether the first CSV row is a header to skip
    pub has_headers: bool,
    /// Output directory for results
    pub output_dir: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::Binary,
            files: vec![],
            class_count: 5,
            decision_threshold: 0.5,
            roc_resolution: DEFAULT_ROC_RESOLUTION,
            epsilon: Epsilon::default(),
            ranking: None,
            has_headers: true,
            output_dir: "eval/results".to_string(),
        }
    }
}

impl EvaluationConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> EvalResult<()> {
        if self.class_count < 2 {
            return Err(EvalError::InvalidConfig(format!(
                "class_count must be at least 2, got {}",
                self.class_count
            )));
        }
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(EvalError::InvalidConfig(format!(
                "decision_threshold must be in [0, 1], got {}",
                self.decision_threshold
            )));
        }
        ThresholdGrid::new(self.roc_resolution)?;
        self.epsilon.validate()
    }

    pub fn ranking_metric(&self) -> Metric {
        self.ranking.unwrap_or_else(|| Metric::default_for(self.mode))
    }

    pub fn metric_settings(&self) -> EvalResult<MetricSettings> {
        Ok(MetricSettings {
            class_count: self.class_count,
            decision_threshold: self.decision_threshold,
            grid: ThresholdGrid::new(self.roc_resolution)?,
            epsilon: self.epsilon,
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            class_count: self.class_count,
            has_headers: self.has_headers,
        }
    }
}

/// Where one model's outputs come from
#[derive(Debug, Clone)]
pub enum ModelSource {
    File(PathBuf),
    Dataset { name: String, dataset: Dataset },
}

impl ModelSource {
    pub fn name(&self) -> String {
        match self {
            ModelSource::File(path) => path.display().to_string(),
            ModelSource::Dataset { name, .. } => name.clone(),
        }
    }
}

/// Result of evaluating one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeStatus {
    Evaluated {
        metrics: EvaluationMetrics,
        class_distribution: BTreeMap<String, usize>,
    },
    Failed {
        error: String,
    },
}

impl ModelOutcome {
    pub fn metrics(&self) -> Option<&EvaluationMetrics> {
        match &self.status {
            OutcomeStatus::Evaluated { metrics, .. } => Some(metrics),
            OutcomeStatus::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }
}

/// Complete evaluation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResults {
    pub config: EvaluationConfig,
    pub outcomes: Vec<ModelOutcome>,
    pub ranking: RankingSummary,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Main evaluation pipeline
pub struct EvaluationPipeline {
    config: EvaluationConfig,
    sources: Vec<ModelSource>,
}

impl EvaluationPipeline {
    /// Pipeline over the files listed in `config`
    pub fn new(config: EvaluationConfig) -> Self {
        let sources = config
            .files
            .iter()
            .map(|f| ModelSource::File(PathBuf::from(f)))
            .collect();
        Self { config, sources }
    }

    /// Add a source after the configured files
    pub fn with_source(mut self, source: ModelSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Load and evaluate a single source
    pub fn evaluate_source(&self, source: &ModelSource, settings: &MetricSettings) -> EvalResult<(EvaluationMetrics, BTreeMap<String, usize>)> {
        let loaded;
        let dataset = match source {
            ModelSource::File(path) => {
                loaded = Dataset::load_csv(path, self.config.mode, &self.config.load_options())?;
                &loaded
            }
            ModelSource::Dataset { dataset, .. } => {
                if dataset.mode() != self.config.mode {
                    return Err(EvalError::InvalidConfig(format!(
                        "dataset is {} but the pipeline evaluates {}",
                        dataset.mode(),
                        self.config.mode
                    )));
                }
                dataset
            }
        };

        let metrics = settings.evaluate(dataset)?;
        Ok((metrics, dataset.class_distribution()))
    }

    /// Run the full evaluation pipeline
    pub fn run(&self) -> Result<EvaluationResults> {
        self.config.validate().context("Invalid evaluation configuration")?;
        let settings = self.config.metric_settings()?;
        let metric = self.config.ranking_metric();

        if self.sources.is_empty() {
            tracing::warn!("No model files to evaluate");
        }

        let mut outcomes = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let name = source.name();
            tracing::info!("Evaluating {} ({})", name, self.config.mode);

            let status = match self.evaluate_source(source, &settings) {
                Ok((metrics, class_distribution)) => {
                    match metrics.get(metric) {
                        Some(value) => tracing::info!("  {} - {}: {:.6} (n={})", name, metric, value, metrics.support),
                        None => tracing::info!("  {} - evaluated {} samples", name, metrics.support),
                    }
                    OutcomeStatus::Evaluated {
                        metrics,
                        class_distribution,
                    }
                }
                Err(err) => {
                    tracing::warn!("  {} - evaluation failed: {}", name, err);
                    OutcomeStatus::Failed { error: err.to_string() }
                }
            };

            outcomes.push(ModelOutcome { name, status });
        }

        let ranking = rank(
            &metric,
            outcomes.iter().map(|o| (o.name.as_str(), o.metrics())),
        );

        match &ranking.best {
            Some(best) => tracing::info!("Best model by {}: {} ({:.6})", ranking.metric, best.name, best.value),
            None => tracing::warn!("No model could be ranked by {}", ranking.metric),
        }

        Ok(EvaluationResults {
            config: self.config.clone(),
            outcomes,
            ranking,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Save results to JSON file
    pub fn save_results(results: &EvaluationResults, output_path: &Path) -> Result<()> {
        std::fs::create_dir_all(output_path.parent().unwrap_or(Path::new(".")))?;
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write results to {}", output_path.display()))?;
        tracing::info!("Results saved to {}", output_path.display());
        Ok(())
    }

    /// Console report: one block per file, then the best model
    pub fn format_text(results: &EvaluationResults) -> String {
        let mut out = String::new();

        for outcome in &results.outcomes {
            out.push_str(&format!("Evaluating {}\n", outcome.name));
            match &outcome.status {
                OutcomeStatus::Evaluated { metrics, .. } => out.push_str(&metrics.format()),
                OutcomeStatus::Failed { error } => out.push_str(&format!("Error: {}\n", error)),
            }
            out.push_str(&format!("{:-<45}\n", ""));
        }

        match &results.ranking.best {
            Some(best) => out.push_str(&format!(
                "Best performing model: {} with {} = {:.6}\n",
                best.name, results.ranking.metric, best.value
            )),
            None => out.push_str(&format!("No model could be ranked by {}\n", results.ranking.metric)),
        }

        out
    }

    /// Generate a markdown report
    pub fn generate_report(results: &EvaluationResults) -> String {
        let mut report = String::new();

        report.push_str("# Model Evaluation Report\n\n");
        report.push_str(&format!("**Generated:** {}\n\n", results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push_str(&format!("**Version:** {}\n\n", results.version));
        report.push_str(&format!("**Mode:** {}\n\n", results.config.mode));

        report.push_str("## Summary\n\n");
        match &results.ranking.best {
            Some(best) => report.push_str(&format!(
                "**Best Model:** {} ({}={:.6}, {:?})\n\n",
                best.name, results.ranking.metric, best.value, results.ranking.direction
            )),
            None => report.push_str("**Best Model:** none (no file evaluated successfully)\n\n"),
        }

        report.push_str("### Model Comparison\n\n");
        let columns = comparison_columns(results.config.mode);
        report.push_str("| Model | Samples |");
        for metric in &columns {
            report.push_str(&format!(" {} |", metric));
        }
        report.push('\n');
        report.push_str("|-------|---------|");
        for _ in &columns {
            report.push_str("------|");
        }
        report.push('\n');

        for outcome in &results.outcomes {
            match outcome.metrics() {
                Some(metrics) => {
                    report.push_str(&format!("| {} | {} |", outcome.name, metrics.support));
                    for metric in &columns {
                        let cell = metrics.get(*metric).map_or("-".to_string(), |v| format!("{:.6}", v));
                        report.push_str(&format!(" {} |", cell));
                    }
                }
                None => {
                    report.push_str(&format!("| {} | failed |", outcome.name));
                    for _ in &columns {
                        report.push_str(" - |");
                    }
                }
            }
            report.push('\n');
        }

        report.push_str("\n## Detailed Results\n\n");

        for outcome in &results.outcomes {
            report.push_str(&format!("### {}\n\n", outcome.name));
            match &outcome.status {
                OutcomeStatus::Evaluated {
                    metrics,
                    class_distribution,
                } => {
                    report.push_str(&format!("- Samples: {}\n", metrics.support));
                    for (class, count) in class_distribution {
                        report.push_str(&format!("- {}: {}\n", class, count));
                    }
                    report.push_str(&format!("\n```\n{}```\n\n", metrics.format()));
                }
                OutcomeStatus::Failed { error } => {
                    report.push_str(&format!("Evaluation failed: `{}`\n\n", error));
                }
            }
        }

        report.push_str("## Configuration\n\n");
        report.push_str(&format!(
            "```json\n{}\n```\n",
            serde_json::to_string_pretty(&results.config).unwrap_or_default()
        ));

        report
    }
}

fn comparison_columns(mode: EvaluationMode) -> Vec<Metric> {
    match mode {
        EvaluationMode::Multiclass => vec![Metric::Loss, Metric::Accuracy],
        EvaluationMode::Binary => vec![
            Metric::Loss,
            Metric::Accuracy,
            Metric::Precision,
            Metric::Recall,
            Metric::F1,
            Metric::AucRoc,
        ],
        EvaluationMode::Regression => vec![Metric::Mse, Metric::Mae, Metric::Mare],
    }
}
