// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Sample types and CSV loading for model-output evaluation
//!
//! Each CSV file holds one model's outputs next to the ground truth:
//! - multiclass: `actual_class (1..=K), p_1, ..., p_K`
//! - binary: `label (0|1), score`
//! - regression: `actual, predicted`
//!
//! Any malformed row aborts the load for the whole file.

use crate::error::{EvalError, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Number of leading rows echoed at debug level while loading
const PREVIEW_ROWS: usize = 10;

/// Which family of metrics a file is evaluated with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    Multiclass,
    Binary,
    Regression,
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvaluationMode::Multiclass => "multiclass",
            EvaluationMode::Binary => "binary",
            EvaluationMode::Regression => "regression",
        };
        f.write_str(name)
    }
}

impl FromStr for EvaluationMode {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "multiclass" | "mcc" => Ok(EvaluationMode::Multiclass),
            "binary" | "svbr" => Ok(EvaluationMode::Binary),
            "regression" | "svcr" => Ok(EvaluationMode::Regression),
            other => Err(EvalError::InvalidConfig(format!("unknown evaluation mode '{}'", other))),
        }
    }
}

/// Ground-truth label for binary classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    pub fn to_binary(&self) -> u8 {
        match self {
            Label::Positive => 1,
            Label::Negative => 0,
        }
    }

    /// Create from binary prediction (1 = positive, anything else = negative)
    pub fn from_binary(value: u8) -> Self {
        if value == 1 {
            Label::Positive
        } else {
            Label::Negative
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Label::Positive)
    }
}

/// One multiclass record: the true class (0-based) and a probability per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MulticlassSample {
    pub actual_class: usize,
    pub probabilities: Vec<f64>,
}

impl MulticlassSample {
    /// Argmax over the probabilities; ties go to the lowest class index
    pub fn predicted_class(&self) -> usize {
        let mut best = 0;
        for (idx, p) in self.probabilities.iter().enumerate().skip(1) {
            if *p > self.probabilities[best] {
                best = idx;
            }
        }
        best
    }
}

/// One binary record: the true label and the predicted P(positive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinarySample {
    pub label: Label,
    pub score: f64,
}

/// One regression record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionSample {
    pub actual: f64,
    pub predicted: f64,
}

/// Options that shape how a CSV file is read
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub class_count: usize,
    pub has_headers: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            class_count: 5,
            has_headers: true,
        }
    }
}

/// The full sample sequence of one model file
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Multiclass(Vec<MulticlassSample>),
    Binary(Vec<BinarySample>),
    Regression(Vec<RegressionSample>),
}

impl Dataset {
    /// Load a model-output CSV file
    pub fn load_csv(path: &Path, mode: EvaluationMode, options: &LoadOptions) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| EvalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, path, mode, options)
    }

    /// Load from any reader; `source` names the input in error messages
    pub fn from_reader<R: Read>(
        reader: R,
        source: &Path,
        mode: EvaluationMode,
        options: &LoadOptions,
    ) -> Result<Self> {
        let records = read_records(reader, source, options.has_headers)?;
        let dataset = match mode {
            EvaluationMode::Multiclass => {
                Dataset::Multiclass(parse_rows(&records, |r, row| parse_multiclass(r, row, options.class_count))?)
            }
            EvaluationMode::Binary => Dataset::Binary(parse_rows(&records, parse_binary)?),
            EvaluationMode::Regression => Dataset::Regression(parse_rows(&records, parse_regression)?),
        };

        tracing::debug!("Loaded {} {} samples from {}", dataset.len(), mode, source.display());
        Ok(dataset)
    }

    pub fn mode(&self) -> EvaluationMode {
        match self {
            Dataset::Multiclass(_) => EvaluationMode::Multiclass,
            Dataset::Binary(_) => EvaluationMode::Binary,
            Dataset::Regression(_) => EvaluationMode::Regression,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Multiclass(s) => s.len(),
            Dataset::Binary(s) => s.len(),
            Dataset::Regression(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of ground-truth classes; empty for regression
    pub fn class_distribution(&self) -> BTreeMap<String, usize> {
        let mut dist = BTreeMap::new();
        match self {
            Dataset::Multiclass(samples) => {
                for s in samples {
                    *dist.entry(format!("y={}", s.actual_class + 1)).or_insert(0) += 1;
                }
            }
            Dataset::Binary(samples) => {
                for s in samples {
                    *dist.entry(format!("{:?}", s.label)).or_insert(0) += 1;
                }
            }
            Dataset::Regression(_) => {}
        }
        dist
    }

    /// Seeded synthetic dataset. `noise` in [0, 1]: 0 yields perfect predictions.
    pub fn synthetic(mode: EvaluationMode, size: usize, noise: f64, seed: u64, class_count: usize) -> Result<Self> {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        if !(0.0..=1.0).contains(&noise) {
            return Err(EvalError::InvalidConfig(format!("noise must be in [0, 1], got {}", noise)));
        }
        if mode == EvaluationMode::Multiclass && class_count < 2 {
            return Err(EvalError::InvalidConfig("class_count must be at least 2".to_string()));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let dataset = match mode {
            EvaluationMode::Multiclass => Dataset::Multiclass(
                (0..size)
                    .map(|_| {
                        let actual_class = rng.gen_range(0..class_count);
                        let mut probabilities: Vec<f64> = (0..class_count).map(|_| rng.gen::<f64>() * noise).collect();
                        probabilities[actual_class] += 1.0 - noise;
                        let total: f64 = probabilities.iter().sum();
                        if total > 0.0 {
                            probabilities.iter_mut().for_each(|p| *p /= total);
                        }
                        MulticlassSample { actual_class, probabilities }
                    })
                    .collect(),
            ),
            EvaluationMode::Binary => Dataset::Binary(
                (0..size)
                    .map(|_| {
                        let positive = rng.gen_bool(0.5);
                        let target = if positive { 1.0 } else { 0.0 };
                        let score = (target * (1.0 - noise) + noise * rng.gen::<f64>()).clamp(0.0, 1.0);
                        BinarySample {
                            label: if positive { Label::Positive } else { Label::Negative },
                            score,
                        }
                    })
                    .collect(),
            ),
            EvaluationMode::Regression => Dataset::Regression(
                (0..size)
                    .map(|_| {
                        let actual: f64 = rng.gen_range(-50.0..50.0);
                        let predicted = actual + noise * 10.0 * rng.gen_range(-1.0..1.0_f64);
                        RegressionSample { actual, predicted }
                    })
                    .collect(),
            ),
        };

        Ok(dataset)
    }
}

fn read_records<R: Read>(reader: R, source: &Path, has_headers: bool) -> Result<Vec<StringRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| EvalError::Csv {
            path: source.to_path_buf(),
            source: err,
        })
}

fn parse_rows<T: fmt::Debug>(
    records: &[StringRecord],
    mut parse: impl FnMut(&StringRecord, usize) -> Result<T>,
) -> Result<Vec<T>> {
    let mut samples = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        // Rows are reported 1-based, counting data rows only
        let sample = parse(record, idx + 1)?;
        if idx < PREVIEW_ROWS {
            tracing::debug!("row {}: {:?}", idx + 1, sample);
        }
        samples.push(sample);
    }
    Ok(samples)
}

fn field<'a>(record: &'a StringRecord, row: usize, column: usize) -> Result<&'a str> {
    record.get(column).ok_or(EvalError::MissingField { row, column })
}

fn parse_f64(record: &StringRecord, row: usize, column: usize) -> Result<f64> {
    let raw = field(record, row, column)?;
    // `f64::from_str` accepts NaN and infinities; those are not data
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(EvalError::Parse {
            row,
            column,
            value: raw.to_string(),
        }),
    }
}

fn parse_probability(record: &StringRecord, row: usize, column: usize) -> Result<f64> {
    let value = parse_f64(record, row, column)?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(EvalError::InvalidProbability { row, value });
    }
    Ok(value)
}

fn parse_multiclass(record: &StringRecord, row: usize, class_count: usize) -> Result<MulticlassSample> {
    let raw = field(record, row, 0)?;
    let class: i64 = raw.parse().map_err(|_| EvalError::Parse {
        row,
        column: 0,
        value: raw.to_string(),
    })?;
    if class < 1 || class > class_count as i64 {
        return Err(EvalError::ClassOutOfRange { row, class, class_count });
    }

    let probabilities = (1..=class_count)
        .map(|column| parse_probability(record, row, column))
        .collect::<Result<Vec<_>>>()?;

    Ok(MulticlassSample {
        actual_class: (class - 1) as usize,
        probabilities,
    })
}

fn parse_binary(record: &StringRecord, row: usize) -> Result<BinarySample> {
    let raw_label = parse_f64(record, row, 0)?;
    let label = if raw_label == 1.0 {
        Label::Positive
    } else if raw_label == 0.0 {
        Label::Negative
    } else {
        return Err(EvalError::InvalidLabel { row, value: raw_label });
    };
    let score = parse_probability(record, row, 1)?;
    Ok(BinarySample { label, score })
}

fn parse_regression(record: &StringRecord, row: usize) -> Result<RegressionSample> {
    Ok(RegressionSample {
        actual: parse_f64(record, row, 0)?,
        predicted: parse_f64(record, row, 1)?,
    })
}
