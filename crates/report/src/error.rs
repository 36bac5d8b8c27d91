//! Error types for report generation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Malformed CSV at line {line}: {reason}")]
    Csv { line: usize, reason: String },

    #[error("Run already completed, {0} rejected")]
    RunFinished(&'static str),

    #[error("Enrichment failed for {path}: {reason}")]
    Enrichment { path: String, reason: String },
}

impl From<toml::de::Error> for ReportError {
    fn from(e: toml::de::Error) -> Self {
        ReportError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for ReportError {
    fn from(e: toml::ser::Error) -> Self {
        ReportError::Config(e.to_string())
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
