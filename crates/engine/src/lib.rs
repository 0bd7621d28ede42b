//! Bot Instance & Bot Supervisor (spec §4.7, §4.8). Replaces the teacher's
//! single-symbol, websocket-driven `Engine` with a supervisor owning any
//! number of independent bot tasks, each running its own fetch -> strategy
//! fan-out -> weighted-vote -> size -> submit cycle against the shared
//! `order-pipeline`.

pub mod bot;
pub mod error;
pub mod strategy_factory;
pub mod supervisor;

pub use bot::{BotHandle, StatusSnapshot};
pub use error::EngineError;
pub use supervisor::{BotSummary, BotSupervisor, SupervisorStatus};
