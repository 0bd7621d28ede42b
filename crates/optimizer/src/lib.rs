//! Auto-Optimizer Manager (spec §4.9). Replaces the teacher's rayon/grid
//! search `Optimizer`, which swept historical backtests over a Cartesian
//! product of parameter sets, with a live tuner that adjusts a running bot's
//! parameters from its own realized trade performance. Grounded on
//! `examples/original_source/src/bot/auto_optimizer.py`, the Python module
//! this component was distilled from; the teacher's ring-buffer-and-config-
//! struct architecture is kept, its grid-search content is not.

pub mod bot_optimizer;
pub mod config;
pub mod error;
pub mod manager;
pub mod mode;
pub mod params;
pub mod state;

pub use bot_optimizer::{BotAutoOptimizer, OptimizerStatus, TradeResult};
pub use config::OptimizerConfig;
pub use error::OptimizerError;
pub use manager::{AutoOptimizerManager, Recommendation, RecommendationPriority};
pub use mode::{ModePreset, OptimizationMode};
pub use params::{adjustable_parameters, ParamLimits, ADJUSTABLE_PARAMETER_NAMES};
pub use state::OptimizerState;
