use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailtrackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tracking error: {0}")]
    Track(#[from] TrackError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Outcomes of tracker operations that the caller must report.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Tracker '{0}' not found")]
    NotFound(String),

    #[error("Tracker '{0}' already exists")]
    Conflict(String),

    #[error("Invalid tracker id '{id}': {reason}")]
    InvalidTrackerId { id: String, reason: String },

    #[error("Failed to gather entropy for log id: {0}")]
    Entropy(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] crate::db::DatabaseError),
}

pub type Result<T> = std::result::Result<T, MailtrackError>;
