use tokio::sync::broadcast;
use tracing::trace;

use crate::messages::TelemetryEvent;

/// Default channel capacity (spec §4.10): slow subscribers that fall more
/// than this many events behind start missing events (they get
/// `RecvError::Lagged`, not a panic or backpressure on producers).
pub const DEFAULT_CAPACITY: usize = 1024;

/// The process-wide telemetry bus. Cloning a `TelemetrySink` clones the
/// sender handle, not the channel — every clone publishes to the same
/// subscribers.
#[derive(Clone)]
pub struct TelemetrySink {
    sender: broadcast::Sender<TelemetryEvent>,
}

impl TelemetrySink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Returns the number of subscribers that received
    /// it. A return of `0` (no subscribers) is not an error — telemetry is
    /// best-effort by design.
    pub fn publish(&self, event: TelemetryEvent) -> usize {
        match self.sender.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                trace!(?event, "telemetry event dropped: no subscribers");
                0
            }
        }
    }
}

impl Default for TelemetrySink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::LogLevel;
    use chrono::Utc;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let sink = TelemetrySink::new(16);
        let mut rx = sink.subscribe();
        sink.publish(TelemetryEvent::Log {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: "hello".to_string(),
        });
        let received = rx.recv().await.unwrap();
        assert!(matches!(received, TelemetryEvent::Log { .. }));
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let sink = TelemetrySink::new(16);
        let n = sink.publish(TelemetryEvent::Log {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: "no one is listening".to_string(),
        });
        assert_eq!(n, 0);
    }
}
