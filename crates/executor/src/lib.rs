//! Executor crate: the bookkeeping step of the order pipeline (spec §4.6
//! "Record"). Tracks cash and positions per account (`Portfolio`) and the
//! authoritative per-order status index (`OrderIndex`) that enforces
//! monotone status transitions.
//!
//! Does not talk to a broker itself — that's the `broker` crate's job. This
//! crate exists purely to keep local state consistent with what the broker
//! reports.

pub mod error;
pub mod order_index;
pub mod portfolio;

pub use error::ExecutorError;
pub use order_index::OrderIndex;
pub use portfolio::Portfolio;
