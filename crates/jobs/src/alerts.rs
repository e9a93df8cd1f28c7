//! User-visible alert channel backed by a `tokio::sync::broadcast` channel.
//!
//! Job failures are not returned to the caller that started the job; they
//! are published here as single-line messages for whatever UI is listening.

use chrono::Utc;
use logibooks_core::types::Timestamp;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

/// A failure message meant for the user.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub message: String,

    /// Name of the job kind that failed, e.g. `"validation"`.
    pub operation: Option<&'static str>,

    pub timestamp: Timestamp,
}

impl Alert {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            operation: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_operation(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }
}

// ---------------------------------------------------------------------------
// AlertBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// Fan-out channel for [`Alert`]s, shared via `Arc<AlertBus>`.
pub struct AlertBus {
    sender: broadcast::Sender<Alert>,
}

impl AlertBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an alert to all current subscribers.
    ///
    /// With no subscribers the alert is only logged.
    pub fn publish(&self, alert: Alert) {
        tracing::warn!(
            operation = alert.operation.unwrap_or("-"),
            message = %alert.message,
            "Alert raised",
        );
        // SendError only means there are zero receivers.
        let _ = self.sender.send(alert);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.sender.subscribe()
    }
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_alert() {
        let bus = AlertBus::default();
        let mut rx = bus.subscribe();

        bus.publish(Alert::new("Register not found").with_operation("validation"));

        let alert = rx.recv().await.expect("should receive the alert");
        assert_eq!(alert.message, "Register not found");
        assert_eq!(alert.operation, Some("validation"));
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = AlertBus::default();
        bus.publish(Alert::new("nobody listens"));
    }
}
