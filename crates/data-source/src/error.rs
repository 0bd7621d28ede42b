use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("unknown data source: {0}")]
    UnknownSource(String),

    #[error("data source '{0}' is already connected")]
    AlreadyConnected(String),

    #[error("data not found for symbol '{0}'")]
    NotFound(String),

    #[error("data source transport error: {0}")]
    Transport(String),

    #[error("data source call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ErrorExt for DataSourceError {
    fn kind(&self) -> ErrorKind {
        match self {
            DataSourceError::UnknownSource(_) | DataSourceError::NotFound(_) => ErrorKind::ClientError,
            DataSourceError::AlreadyConnected(_) => ErrorKind::ConstraintError,
            DataSourceError::Transport(_) => ErrorKind::ExternalError,
            DataSourceError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}
