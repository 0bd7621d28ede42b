use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("unknown broker: {0}")]
    UnknownBroker(String),

    #[error("broker '{0}' is already connected")]
    AlreadyConnected(String),

    #[error("failed to connect to broker '{0}': {1}")]
    ConnectionFailed(String, String),

    #[error("broker '{0}' does not support this capability")]
    Unsupported(String),

    #[error("order '{0}' not found")]
    OrderNotFound(String),

    #[error("broker call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("broker transport error: {0}")]
    Transport(String),
}

impl ErrorExt for BrokerError {
    fn kind(&self) -> ErrorKind {
        match self {
            BrokerError::UnknownBroker(_) | BrokerError::OrderNotFound(_) => ErrorKind::ClientError,
            BrokerError::AlreadyConnected(_) => ErrorKind::ConstraintError,
            BrokerError::Unsupported(_) => ErrorKind::ClientError,
            BrokerError::ConnectionFailed(..) | BrokerError::Transport(_) => ErrorKind::ExternalError,
            BrokerError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}
