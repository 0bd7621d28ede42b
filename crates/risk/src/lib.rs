//! Risk Manager (spec §4.5): portfolio-level limits, VIX gating, kill switch,
//! daily loss caps. Single process-wide instance.

pub mod error;
pub mod simple_manager;

pub use error::RiskError;
pub use simple_manager::{RiskDecision, RiskLimits, SimpleRiskManager};
