//! Domain notifications emitted after successful writes.
//!
//! Notifications are fire-and-forget: a failed publish is reported to the
//! caller of `publish` but never undoes the write it describes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{EntityId, MessageId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Which write a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Created,
    Updated,
    Deleted,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Created => write!(f, "created"),
            NotificationKind::Updated => write!(f, "updated"),
            NotificationKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// Event handed to the notification channel after a committed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainNotification {
    /// The command that caused the write.
    pub message_id: MessageId,

    /// The entity that was written.
    pub entity_id: EntityId,

    /// Entity type name (e.g., "user").
    pub entity_type: String,

    pub kind: NotificationKind,

    /// When the write was committed.
    pub occurred_at: DateTime<Utc>,
}

impl DomainNotification {
    /// Creates a notification stamped with the current time.
    pub fn new(
        message_id: MessageId,
        entity_id: EntityId,
        entity_type: impl Into<String>,
        kind: NotificationKind,
    ) -> Self {
        Self {
            message_id,
            entity_id,
            entity_type: entity_type.into(),
            kind,
            occurred_at: Utc::now(),
        }
    }
}

/// Errors a notification producer can report.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The receiving end of the channel is gone.
    #[error("Notification channel closed")]
    ChannelClosed,

    /// The producer could not deliver the notification.
    #[error("Failed to publish notification: {0}")]
    Publish(String),
}

/// Outbound channel for domain notifications.
///
/// Called concurrently from every in-flight request of a bounded context.
#[async_trait]
pub trait NotificationProducer: Send + Sync {
    async fn publish(&self, notification: DomainNotification) -> Result<(), NotificationError>;
}

/// Producer that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProducer;

#[async_trait]
impl NotificationProducer for NoopProducer {
    async fn publish(&self, _notification: DomainNotification) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// Producer that writes each notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProducer;

#[async_trait]
impl NotificationProducer for LoggingProducer {
    async fn publish(&self, notification: DomainNotification) -> Result<(), NotificationError> {
        tracing::info!(
            message_id = %notification.message_id,
            entity_id = %notification.entity_id,
            entity_type = %notification.entity_type,
            kind = %notification.kind,
            "domain notification"
        );
        Ok(())
    }
}

/// Producer that forwards notifications into an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelProducer {
    sender: mpsc::UnboundedSender<DomainNotification>,
}

impl ChannelProducer {
    /// Creates a producer and the receiver that consumes its notifications.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DomainNotification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl NotificationProducer for ChannelProducer {
    async fn publish(&self, notification: DomainNotification) -> Result<(), NotificationError> {
        self.sender
            .send(notification)
            .map_err(|_| NotificationError::ChannelClosed)
    }
}
