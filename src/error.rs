use std::io;

use thiserror::Error;

/// Application-wide error type for the anchore-ci tool.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to write configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Usage(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bad response from {url} - httpcode={status} data={body}")]
    HttpStatus { url: String, status: u16, body: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timed out after {secs} seconds waiting for {waiting_for}")]
    Timeout { waiting_for: &'static str, secs: u64 },

    #[error("Failed to add image to anchore engine. Error: {0}")]
    AddImage(String),

    #[error("Unable to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Anchore engine is already running.")]
    EngineAlreadyRunning,

    #[error("Failed to generate {} report(s): {}", .0.len(), .0.join(", "))]
    ReportsFailed(Vec<String>),
}

impl AppError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        AppError::Config(msg.into())
    }

    pub fn usage<S: Into<String>>(msg: S) -> Self {
        AppError::Usage(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        AppError::MalformedResponse(msg.into())
    }
}
