use thiserror::Error;

/// The seven-kind error taxonomy from spec §7. Every crate-local error type
/// maps into one of these via `ErrorExt::kind`, so the order pipeline and any
/// RPC-facing layer can convert losslessly without downcasting concrete types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientError,
    ConstraintError,
    ComplianceError,
    RiskError,
    ExternalError,
    Timeout,
    InternalError,
}

/// Implemented by every crate-local error enum so callers can classify an
/// error without matching on its concrete type.
pub trait ErrorExt {
    fn kind(&self) -> ErrorKind;
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid input for field '{0}': {1}")]
    InvalidInput(String, String),

    #[error("calculation error: {0}")]
    Calculation(String),
}

impl ErrorExt for CoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidInput(..) => ErrorKind::ClientError,
            CoreError::Calculation(_) => ErrorKind::InternalError,
        }
    }
}
