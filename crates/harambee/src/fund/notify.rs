use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifecycle events handed to the notification collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    WelcomeCreated,
    CaseSubmitted,
    CaseStatusChanged,
}

impl NotificationEvent {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationEvent::WelcomeCreated => "welcome_created",
            NotificationEvent::CaseSubmitted => "case_submitted",
            NotificationEvent::CaseStatusChanged => "case_status_changed",
        }
    }
}

/// Fire-and-forget notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub event: NotificationEvent,
    pub recipient: String,
    pub payload: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(event: NotificationEvent, recipient: impl Into<String>) -> Self {
        Self {
            event,
            recipient: recipient.into(),
            payload: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }
}

/// Trait describing outbound notification hooks (e-mail, SMS adapters).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Deliver after the triggering write has committed; delivery failure must
/// never roll back or fail the operation, so errors are logged and dropped.
pub(crate) fn dispatch<N: Notifier + ?Sized>(notifier: &N, notification: Notification) {
    let event = notification.event.label();
    let recipient = notification.recipient.clone();
    if let Err(err) = notifier.notify(notification) {
        tracing::warn!(event, %recipient, error = %err, "notification delivery failed");
    }
}
