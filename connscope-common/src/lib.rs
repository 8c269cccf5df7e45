pub mod config;
pub use config::{AnalysisConfig, Config, ExportConfig, LogConfig, SplitConfig};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnScopeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid query timestamp {input:?} (expected YYYY-MM-DD HH:MM:SS.ffffff)")]
    QueryTimestamp { input: String },
    #[error("{}: row {row}: invalid {field} value {value:?}", .path.display())]
    RecordField {
        path: PathBuf,
        row: u64,
        field: &'static str,
        value: String,
    },
    #[error("{}: missing required column {column:?}", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("no connection records found; volume statistics are undefined")]
    NoData,
    #[error("partial series axis mismatch: {0}")]
    AxisMismatch(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ConnScopeError>;
