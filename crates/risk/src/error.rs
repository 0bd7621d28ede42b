use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("invalid risk configuration: {0}")]
    InvalidParameters(String),

    #[error("order rejected: {0}")]
    Rejected(String),
}

impl ErrorExt for RiskError {
    fn kind(&self) -> ErrorKind {
        match self {
            RiskError::InvalidParameters(_) => ErrorKind::ClientError,
            RiskError::Rejected(_) => ErrorKind::RiskError,
        }
    }
}
