//! Error types for the navigation bridge

use thiserror::Error;

/// Bridge error type
#[derive(Error, Debug)]
pub enum NavError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Frame transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Invalid robot shape: {0}")]
    Shape(String),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

/// Failure of the external frame-transform lookup service.
///
/// Covers unknown frames, expired caches and not-yet-available data.
/// Always handled explicitly at the call site; a failed lookup means
/// "skip this step", never a process-level error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no transform from '{source_frame}' to '{target_frame}': {reason}")]
pub struct TransformError {
    pub target_frame: String,
    pub source_frame: String,
    pub reason: String,
}

impl TransformError {
    pub fn new(
        target_frame: impl Into<String>,
        source_frame: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            target_frame: target_frame.into(),
            source_frame: source_frame.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
