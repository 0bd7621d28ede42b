use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

/// Per spec §4.4.4: checks never fail with exceptions for business reasons
/// (`Block`/`StopDay` are valid `CheckResult`s, not errors). `InvalidState`
/// is reserved for programmer errors such as a missing account snapshot.
#[derive(Error, Debug)]
pub enum ComplianceError {
    #[error("invalid compliance state: {0}")]
    InvalidState(String),

    #[error("snapshot deserialization failed: {0}")]
    SnapshotError(#[from] serde_json::Error),
}

impl ErrorExt for ComplianceError {
    fn kind(&self) -> ErrorKind {
        match self {
            ComplianceError::InvalidState(_) => ErrorKind::InternalError,
            ComplianceError::SnapshotError(_) => ErrorKind::InternalError,
        }
    }
}
