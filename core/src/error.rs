use crate::tables::TableName;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Missing required field '{field}' ({})", describe_row(.row))]
    MissingField { field: String, row: Option<usize> },

    #[error("Input contains no transaction rows")]
    EmptyInput,

    #[error("Malformed value {value:?} for '{field}' at row {row}")]
    Malformed {
        row:   usize,
        field: String,
        value: String,
    },

    #[error("Risk score {risk_score} at row {row} falls outside every risk level")]
    Bucketing { row: usize, risk_score: f64 },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("Failed writing '{}' after {} of 7 tables were written: {source}", .table.file_stem(), .written.len())]
    Export {
        table:   TableName,
        written: Vec<TableName>,
        source:  csv::Error,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

fn describe_row(row: &Option<usize>) -> String {
    match row {
        Some(r) => format!("row {r}"),
        None    => "input header".to_string(),
    }
}
