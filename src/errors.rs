// src/errors.rs

use std::io;

use thiserror::Error;

/// A single input row that could not be turned into a `SalesRecord`.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("malformed record at row {row}: field '{field}' = {value:?} ({reason})")]
pub struct MalformedRecord {
    /// 1-based data row index, header excluded.
    pub row: usize,
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

/// Error type for loading, running and rendering reports.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecord),
    #[error("unknown report '{name}' (expected one of: {expected})")]
    UnknownReport { name: String, expected: String },
    #[error("input is missing required column '{column}'")]
    MissingColumn { column: &'static str },
    #[error("more than one input column maps to '{column}'")]
    DuplicateColumn { column: &'static str },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("report task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
