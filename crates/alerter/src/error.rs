use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlerterError {
    #[error("Telegram API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Telegram API returned an error: {0}")]
    ApiError(String),

    #[error("Alerter is not configured. Missing token or chat_id.")]
    NotConfigured,
}

impl ErrorExt for AlerterError {
    fn kind(&self) -> ErrorKind {
        match self {
            AlerterError::Request(_) => ErrorKind::ExternalError,
            AlerterError::ApiError(_) => ErrorKind::ExternalError,
            AlerterError::NotConfigured => ErrorKind::InternalError,
        }
    }
}
