use core_types::{ErrorExt, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("not enough cash available to execute trade. required: {required}, available: {available}")]
    InsufficientCash { required: String, available: String },

    #[error("position not found for symbol: {0}")]
    PositionNotFound(String),

    #[error("invalid order quantity for closing position. requested: {requested}, available: {available}")]
    InvalidClosingQuantity { requested: String, available: String },

    #[error("an unexpected portfolio state was encountered: {0}")]
    PortfolioError(String),

    #[error("order {order_id} cannot transition from {from:?} to {to:?}")]
    InvalidStatusTransition {
        order_id: uuid::Uuid,
        from: core_types::OrderStatus,
        to: core_types::OrderStatus,
    },

    #[error("order not found: {0}")]
    OrderNotFound(uuid::Uuid),
}

impl ErrorExt for ExecutorError {
    fn kind(&self) -> ErrorKind {
        match self {
            ExecutorError::InsufficientCash { .. } => ErrorKind::ConstraintError,
            ExecutorError::PositionNotFound(_) => ErrorKind::ClientError,
            ExecutorError::InvalidClosingQuantity { .. } => ErrorKind::ConstraintError,
            ExecutorError::PortfolioError(_) => ErrorKind::InternalError,
            ExecutorError::InvalidStatusTransition { .. } => ErrorKind::InternalError,
            ExecutorError::OrderNotFound(_) => ErrorKind::ClientError,
        }
    }
}
