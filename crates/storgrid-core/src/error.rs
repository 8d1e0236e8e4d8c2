//! Error types for StorGrid core.

use thiserror::Error;

use crate::access::AccessDenied;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while loading or validating placement configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid property rule '{0}'")]
    InvalidRule(String),

    #[error("invalid placement filter: {0}")]
    InvalidFilter(String),

    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
}
