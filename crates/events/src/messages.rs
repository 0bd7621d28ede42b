use chrono::{DateTime, Utc};
use core_types::{
    BotId, BrokerName, ComplianceAction, Order, ParameterAdjustment, Signal, ViolationSeverity,
};
use serde::{Deserialize, Serialize};

/// Severity of a log-style telemetry line, kept from the teacher's
/// WebSocket `LogLevel` for parity with however an eventual UI consumes
/// telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One telemetry event (spec §4.10 Telemetry Sink). Broadcast over a
/// `tokio::sync::broadcast` channel; any number of subscribers (an alerter,
/// a future UI, tests) can listen without the producer knowing they exist.
///
/// `#[serde(tag = "type", content = "payload")]` is kept from the teacher's
/// `WsMessage` so downstream JSON consumers see a discriminated union:
/// `{"type": "OrderFilled", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum TelemetryEvent {
    OrderSubmitted { bot_id: BotId, order: Order },
    OrderFilled { bot_id: BotId, order: Order },
    OrderRejected { bot_id: BotId, order: Order, reason: String },
    SignalEmitted { bot_id: BotId, signal: Signal },
    ComplianceViolation {
        bot_id: Option<BotId>,
        broker: BrokerName,
        action: ComplianceAction,
        severity: ViolationSeverity,
        message: String,
        timestamp: DateTime<Utc>,
    },
    ParameterAdjustment { bot_id: BotId, adjustment: ParameterAdjustment },
    BotStateChange { bot_id: BotId, from: String, to: String, timestamp: DateTime<Utc> },
    Log { timestamp: DateTime<Utc>, level: LogLevel, message: String },
}

impl TelemetryEvent {
    pub fn bot_id(&self) -> Option<&str> {
        match self {
            TelemetryEvent::OrderSubmitted { bot_id, .. }
            | TelemetryEvent::OrderFilled { bot_id, .. }
            | TelemetryEvent::OrderRejected { bot_id, .. }
            | TelemetryEvent::SignalEmitted { bot_id, .. }
            | TelemetryEvent::ParameterAdjustment { bot_id, .. }
            | TelemetryEvent::BotStateChange { bot_id, .. } => Some(bot_id.as_str()),
            TelemetryEvent::ComplianceViolation { bot_id, .. } => bot_id.as_deref(),
            TelemetryEvent::Log { .. } => None,
        }
    }
}
