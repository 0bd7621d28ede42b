use configuration::AlerterConfig;
use core_types::ViolationSeverity;
use events::{TelemetryEvent, TelemetrySink};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::AlerterError;

pub mod error;

/// The JSON payload for the Telegram `sendMessage` endpoint.
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str, // To allow for formatting like bold, italics etc.
}

/// A client for sending messages to the Telegram Bot API.
pub struct TelegramAlerter {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramAlerter {
    /// Creates a new `TelegramAlerter`.
    ///
    /// Returns `None` if the token or chat_id is missing from the configuration,
    /// allowing the system to gracefully disable alerting.
    pub fn new(config: &AlerterConfig) -> Option<Self> {
        if config.telegram_token.is_empty() || config.telegram_chat_id.is_empty() {
            tracing::warn!("Telegram alerter is not configured (missing token or chat_id).");
            return None;
        }
        Some(Self { client: Client::new(), token: config.telegram_token.clone(), chat_id: config.telegram_chat_id.clone() })
    }

    /// Sends a text message to the configured Telegram chat.
    pub async fn send_message(&self, message: &str) -> Result<(), AlerterError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "MarkdownV2", // Use Markdown for rich formatting
        };

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(AlerterError::ApiError(error_text));
        }

        Ok(())
    }
}

/// Builds the alert text for a telemetry event, or `None` if this event
/// doesn't warrant a push. Only `ComplianceViolation` at `Critical` severity
/// and `BotStateChange` into `Error` alert — every other event is either
/// routine (fills, signals) or already visible to whoever reads the
/// telemetry stream directly.
fn alert_text(event: &TelemetryEvent) -> Option<String> {
    match event {
        TelemetryEvent::ComplianceViolation { severity: ViolationSeverity::Critical, broker, message, .. } => {
            Some(format!("🚨 *COMPLIANCE*: `{}` {}", escape_markdown(broker), escape_markdown(message)))
        }
        TelemetryEvent::BotStateChange { bot_id, from, to, .. } if to == "Error" => {
            Some(format!("⚠️ *BOT ERROR*: `{}` {} → {}", escape_markdown(bot_id), escape_markdown(from), escape_markdown(to)))
        }
        _ => None,
    }
}

/// A long-running service that subscribes to the telemetry broadcast
/// channel (spec §4.10) and pushes Telegram alerts for the events
/// `alert_text` selects.
pub async fn run_alerter_service(alerter: TelegramAlerter, telemetry: &TelemetrySink) {
    let mut event_rx = telemetry.subscribe();
    tracing::info!("Alerter service started. Listening for critical events.");

    let _ = alerter.send_message("✅ *Trading Engine Started*").await;

    loop {
        match event_rx.recv().await {
            Ok(event) => {
                if let Some(msg) = alert_text(&event) {
                    if let Err(e) = alerter.send_message(&msg).await {
                        tracing::error!(error = ?e, "Failed to send Telegram alert.");
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Alerter service lagged, skipped {} events.", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::error!("Telemetry channel closed. Alerter service shutting down.");
                break;
            }
        }
    }
}

/// A helper function to escape characters that have special meaning in Telegram's MarkdownV2.
fn escape_markdown(text: &str) -> String {
    let special_chars = r"_*[]()~`>#+-=|{}.!";
    special_chars.chars().fold(text.to_string(), |s, c| s.replace(c, &format!("\\{}", c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::ComplianceAction;

    #[test]
    fn critical_compliance_violations_alert() {
        let event = TelemetryEvent::ComplianceViolation {
            bot_id: None,
            broker: "alpaca".to_string(),
            action: ComplianceAction::Block,
            severity: ViolationSeverity::Critical,
            message: "PDT breach".to_string(),
            timestamp: Utc::now(),
        };
        assert!(alert_text(&event).is_some());
    }

    #[test]
    fn warning_compliance_violations_do_not_alert() {
        let event = TelemetryEvent::ComplianceViolation {
            bot_id: None,
            broker: "alpaca".to_string(),
            action: ComplianceAction::Warn,
            severity: ViolationSeverity::Warning,
            message: "approaching PDT limit".to_string(),
            timestamp: Utc::now(),
        };
        assert!(alert_text(&event).is_none());
    }

    #[test]
    fn bot_transition_into_error_alerts() {
        let event = TelemetryEvent::BotStateChange {
            bot_id: "bot-1".to_string(),
            from: "Running".to_string(),
            to: "Error".to_string(),
            timestamp: Utc::now(),
        };
        assert!(alert_text(&event).is_some());
    }

    #[test]
    fn bot_transition_into_running_does_not_alert() {
        let event = TelemetryEvent::BotStateChange {
            bot_id: "bot-1".to_string(),
            from: "Starting".to_string(),
            to: "Running".to_string(),
            timestamp: Utc::now(),
        };
        assert!(alert_text(&event).is_none());
    }
}
