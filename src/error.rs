//! Error types for the stresslens pipeline

use thiserror::Error;

/// Errors that can occur while loading or transforming feed data
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to fetch feed: {0}")]
    FetchError(String),

    #[error("Failed to parse feed rows: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Superseded load for feed: {0}")]
    SupersededLoad(String),
}
