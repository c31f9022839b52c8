// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Model evaluation CLI
//!
//! Usage:
//!   evaluate-models --mode binary model_1.csv model_2.csv model_3.csv
//!   evaluate-models --mode regression --rank-by mae model_*.csv
//!   evaluate-models --mode multiclass --synthetic 1000 --seed 42

use anyhow::Result;
use clap::{Parser, ValueEnum};
use model_eval::datasets::{Dataset, EvaluationMode};
use model_eval::metrics::Metric;
use model_eval::pipeline::{EvaluationConfig, EvaluationPipeline, ModelSource};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Noise levels of the synthetic models, best to worst
const SYNTHETIC_NOISE: [f64; 3] = [0.1, 0.4, 0.8];

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
    All,
}

impl OutputFormat {
    fn text(self) -> bool {
        matches!(self, OutputFormat::Text | OutputFormat::All)
    }

    fn json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::All)
    }

    fn markdown(self) -> bool {
        matches!(self, OutputFormat::Markdown | OutputFormat::All)
    }
}

#[derive(Parser, Debug)]
#[command(name = "evaluate-models")]
#[command(about = "Compute quality metrics for model predictions stored as CSV")]
#[command(version)]
struct Args {
    /// Model output files (CSV, header row skipped)
    files: Vec<PathBuf>,

    /// Evaluation mode (multiclass, binary, regression)
    #[arg(short, long)]
    mode: Option<EvaluationMode>,

    /// JSON config file; flags given on the command line override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of classes in multiclass files
    #[arg(long)]
    class_count: Option<usize>,

    /// Decision threshold for the binary confusion matrix
    #[arg(short, long)]
    threshold: Option<f64>,

    /// ROC grid resolution N (N + 1 thresholds)
    #[arg(long)]
    roc_resolution: Option<usize>,

    /// Metric used to pick the best model (loss, accuracy, f1, auc_roc, mse, ...)
    #[arg(short, long)]
    rank_by: Option<Metric>,

    /// Treat the first row as data instead of a header
    #[arg(long)]
    no_headers: bool,

    /// Evaluate three seeded synthetic models of this many samples instead of files
    #[arg(long)]
    synthetic: Option<usize>,

    /// Random seed for synthetic data
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn build_config(args: &Args) -> Result<EvaluationConfig> {
    let mut config = match &args.config {
        Some(path) => EvaluationConfig::from_json_file(path)?,
        None => EvaluationConfig::default(),
    };

    if let Some(mode) = args.mode {
        config.mode = mode;
    } else if args.config.is_none() {
        anyhow::bail!("--mode is required when no --config is given");
    }
    if !args.files.is_empty() {
        config.files = args.files.iter().map(|p| p.to_string_lossy().to_string()).collect();
    }
    if let Some(k) = args.class_count {
        config.class_count = k;
    }
    if let Some(t) = args.threshold {
        config.decision_threshold = t;
    }
    if let Some(r) = args.roc_resolution {
        config.roc_resolution = r;
    }
    if args.rank_by.is_some() {
        config.ranking = args.rank_by;
    }
    if args.no_headers {
        config.has_headers = false;
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.to_string_lossy().to_string();
    }

    config.validate()?;
    Ok(config)
}

/// One seeded model per noise level; seeds wrap at `u64::MAX`
fn synthetic_sources(config: &EvaluationConfig, size: usize, seed: u64) -> Result<Vec<ModelSource>> {
    SYNTHETIC_NOISE
        .iter()
        .enumerate()
        .map(|(idx, noise)| -> Result<ModelSource> {
            let dataset = Dataset::synthetic(
                config.mode,
                size,
                *noise,
                seed.wrapping_add(idx as u64),
                config.class_count,
            )?;
            Ok(ModelSource::Dataset {
                name: format!("synthetic_{}", idx + 1),
                dataset,
            })
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    tracing::info!("Model Evaluation");
    tracing::info!("Mode: {}", config.mode);
    tracing::info!("Ranking by: {}", config.ranking_metric());

    let mut pipeline = EvaluationPipeline::new(config.clone());

    if let Some(size) = args.synthetic {
        tracing::info!("Generating synthetic models ({} samples, seed={})", size, args.seed);
        for source in synthetic_sources(&config, size, args.seed)? {
            pipeline = pipeline.with_source(source);
        }
    }

    let results = pipeline.run()?;

    if args.format.text() {
        println!("{}", EvaluationPipeline::format_text(&results));
    }

    let output_dir = PathBuf::from(&config.output_dir);
    let timestamp = results.timestamp.format("%Y%m%d_%H%M%S");

    if args.format.json() {
        let json_path = output_dir.join(format!("eval_{}_{}.json", config.mode, timestamp));
        EvaluationPipeline::save_results(&results, &json_path)?;
        println!("JSON results saved to: {}", json_path.display());
    }

    if args.format.markdown() {
        std::fs::create_dir_all(&output_dir)?;
        let md_path = output_dir.join(format!("eval_{}_{}.md", config.mode, timestamp));
        std::fs::write(&md_path, EvaluationPipeline::generate_report(&results))?;
        println!("Markdown report saved to: {}", md_path.display());
    }

    let failed = results.outcomes.iter().filter(|o| o.is_failed()).count();
    if failed > 0 {
        tracing::warn!("{} of {} model files failed to evaluate", failed, results.outcomes.len());
    }

    Ok(())
}
