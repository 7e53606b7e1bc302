use crate::core::error::PoolError;
use std::path::PathBuf;

/// Errors raised while loading or validating a core configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("validation error: {detail}")]
    Validation { detail: String },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
