use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventsError {
    #[error("failed to serialize telemetry event: {0}")]
    Serialization(String),
}

impl ErrorExt for EventsError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::InternalError
    }
}
