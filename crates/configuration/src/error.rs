use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

/// Represents all possible errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Occurs when the configuration file cannot be found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Wraps errors from the `config` crate when loading or parsing the configuration.
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    /// Occurs when configuration values fail validation.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// Failed to initialize the tracing subscriber (already initialized, or
    /// a bad `level` filter string).
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

impl ConfigError {
    /// Creates a new validation error with a formatted message.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }
}

impl ErrorExt for ConfigError {
    fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::FileNotFound(_) => ErrorKind::ClientError,
            ConfigError::LoadError(_) => ErrorKind::ClientError,
            ConfigError::ValidationError(_) => ErrorKind::ClientError,
            ConfigError::LoggingInit(_) => ErrorKind::InternalError,
        }
    }
}
