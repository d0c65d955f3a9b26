//! Error types for Scrub.

use thiserror::Error;

/// Library-level error type for Scrub operations.
#[derive(Error, Debug)]
pub enum ScrubError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No chunks stored for video: {0}")]
    NotFound(String),

    /// A chunk set already exists for the video. Resolved inside ingestion.
    #[error("Chunk set already exists for video: {0}")]
    Conflict(String),

    #[error("Embedding space mismatch: {0}")]
    EmbeddingSpace(String),

    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Chunk store error: {0}")]
    Store(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Scrub operations.
pub type Result<T> = std::result::Result<T, ScrubError>;
