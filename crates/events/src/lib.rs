//! Telemetry Sink (spec §4.10): a process-wide `tokio::sync::broadcast`
//! channel carrying `TelemetryEvent`s from order submission, compliance,
//! risk, and the bot supervisor out to anyone listening — the alerter, a
//! future UI, or a test harness.
//!
//! As a Layer 0 crate, it depends only on `core-types` and provides the
//! definitive shape for all real-time telemetry.

pub mod error;
pub mod messages;
pub mod sink;

pub use error::EventsError;
pub use messages::{LogLevel, TelemetryEvent};
pub use sink::{TelemetrySink, DEFAULT_CAPACITY};
