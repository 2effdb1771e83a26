//! Error types for portico
//!
//! All adaptor failures converge on [`PorticoError`] so callers get one
//! error surface regardless of which third-party library misbehaved.

use thiserror::Error;

/// Main error type for portico operations
#[derive(Error, Debug)]
pub enum PorticoError {
    #[error("missing provider name: set the '{0}' path or query parameter")]
    MissingProviderName(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("template rendering failed: {0}")]
    Template(#[from] TemplateError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Template-specific errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("template render error: {0}")]
    Render(#[from] minijinja::Error),
}

/// Convenient result type for portico operations
pub type Result<T> = std::result::Result<T, PorticoError>;

impl PorticoError {
    /// Create an authentication error
    #[inline]
    pub fn auth<S: Into<String>>(msg: S) -> Self {
        PorticoError::Auth(msg.into())
    }

    /// Create a config error
    #[inline]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PorticoError::Config(msg.into())
    }
}
