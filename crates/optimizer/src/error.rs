use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("bot '{0}' is not registered with the optimizer")]
    UnknownBot(String),

    #[error("bot '{0}' is already registered with the optimizer")]
    AlreadyRegistered(String),

    #[error("unknown adjustable parameter: {0}")]
    UnknownParameter(String),

    #[error("adjustment for '{parameter}' clamped out of bounds: {value} not in [{min}, {max}]")]
    OutOfBounds {
        parameter: String,
        value: rust_decimal::Decimal,
        min: rust_decimal::Decimal,
        max: rust_decimal::Decimal,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ErrorExt for OptimizerError {
    fn kind(&self) -> ErrorKind {
        match self {
            OptimizerError::UnknownBot(_) => ErrorKind::ClientError,
            OptimizerError::AlreadyRegistered(_) => ErrorKind::ClientError,
            OptimizerError::UnknownParameter(_) => ErrorKind::ClientError,
            OptimizerError::OutOfBounds { .. } => ErrorKind::ConstraintError,
            OptimizerError::Json(_) => ErrorKind::InternalError,
        }
    }
}
