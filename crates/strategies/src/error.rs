use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("an error occurred during indicator calculation: {0}")]
    IndicatorError(String),

    #[error("strategy of type '{0}' not found or implemented")]
    StrategyNotFound(String),
}

impl ErrorExt for StrategyError {
    fn kind(&self) -> ErrorKind {
        match self {
            StrategyError::InvalidParameters(_) => ErrorKind::ClientError,
            StrategyError::IndicatorError(_) => ErrorKind::InternalError,
            StrategyError::StrategyNotFound(_) => ErrorKind::ClientError,
        }
    }
}
