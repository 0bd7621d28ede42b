use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown strategy name: {0}")]
    UnknownStrategy(String),

    #[error("strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("data source error: {0}")]
    DataSource(#[from] data_source::DataSourceError),

    #[error("order pipeline error: {0}")]
    Pipeline(#[from] order_pipeline::PipelineError),

    #[error("bot not found: {0}")]
    BotNotFound(String),

    #[error("bot id already registered: {0}")]
    BotAlreadyExists(String),

    #[error("supervisor is at its bot capacity ({0})")]
    CapacityReached(usize),

    #[error("bot '{0}' did not stop within the shutdown grace period")]
    ShutdownTimedOut(String),
}

impl ErrorExt for EngineError {
    fn kind(&self) -> ErrorKind {
        match self {
            EngineError::UnknownStrategy(_) => ErrorKind::ClientError,
            EngineError::Strategy(e) => e.kind(),
            EngineError::DataSource(_) => ErrorKind::ExternalError,
            EngineError::Pipeline(e) => e.kind(),
            EngineError::BotNotFound(_) => ErrorKind::ClientError,
            EngineError::BotAlreadyExists(_) => ErrorKind::ClientError,
            EngineError::CapacityReached(_) => ErrorKind::ConstraintError,
            EngineError::ShutdownTimedOut(_) => ErrorKind::Timeout,
        }
    }
}
