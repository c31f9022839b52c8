// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Error taxonomy for metric evaluation
//!
//! Source errors (unreadable file, malformed field) and logic errors
//! (class index out of range) abort the evaluation of one file. Numerical
//! degeneracies are handled by guards in the metric code and only surface
//! here when there is nothing to average over.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}, column {column}: '{value}' is not a number")]
    Parse {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("row {row}: missing column {column}")]
    MissingField { row: usize, column: usize },

    #[error("row {row}: class {class} outside 1..={class_count}")]
    ClassOutOfRange {
        row: usize,
        class: i64,
        class_count: usize,
    },

    #[error("row {row}: expected {expected} class probabilities, found {found}")]
    ProbabilityCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: binary label must be 0 or 1, got {value}")]
    InvalidLabel { row: usize, value: f64 },

    #[error("row {row}: probability {value} outside [0, 1]")]
    InvalidProbability { row: usize, value: f64 },

    #[error("dataset contains no samples")]
    EmptyDataset,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvalError::Parse { row: 3, column: 1, value: "abc".to_string() };
        assert_eq!(format!("{}", err), "row 3, column 1: 'abc' is not a number");

        let err = EvalError::ClassOutOfRange { row: 7, class: 6, class_count: 5 };
        assert!(format!("{}", err).contains("outside 1..=5"));

        let err = EvalError::EmptyDataset;
        assert!(format!("{}", err).contains("no samples"));

        let err = EvalError::InvalidConfig("roc_resolution must be positive".to_string());
        assert!(format!("{}", err).starts_with("invalid configuration"));
    }
}
