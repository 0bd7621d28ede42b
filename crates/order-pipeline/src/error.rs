use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("order throttled: {0}")]
    Throttled(String),

    #[error("could not resolve a price for {0}: no data source returned a quote or bar")]
    PriceUnavailable(String),

    #[error("upstream data source or broker error: {0}")]
    External(String),

    #[error("compliance rejected the order: {0}")]
    Compliance(String),

    #[error("compliance requires explicit confirmation: {0}")]
    RequiresConfirmation(String),

    #[error("risk manager rejected the order: {0}")]
    Risk(String),

    #[error("broker dispatch timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("bookkeeping error: {0}")]
    Bookkeeping(#[from] executor::ExecutorError),
}

impl ErrorExt for PipelineError {
    fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Throttled(_) => ErrorKind::ConstraintError,
            PipelineError::PriceUnavailable(_) => ErrorKind::ExternalError,
            PipelineError::External(_) => ErrorKind::ExternalError,
            PipelineError::Compliance(_) => ErrorKind::ComplianceError,
            PipelineError::RequiresConfirmation(_) => ErrorKind::ComplianceError,
            PipelineError::Risk(_) => ErrorKind::RiskError,
            PipelineError::Timeout(_) => ErrorKind::Timeout,
            PipelineError::Bookkeeping(e) => e.kind(),
        }
    }
}
