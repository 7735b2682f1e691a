//! Push channel for presence status-change events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::presence::PresenceStatus;

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors that can occur delivering a status change.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A presence status change observed between scheduler ticks.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub booking_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PresenceStatus>,
    pub current: PresenceStatus,
    pub at: DateTime<Utc>,
}

/// Interface to the status renderer / push channel.
///
/// Delivery is best-effort: a failed emission is logged and dropped; the
/// next scheduler tick self-corrects.
///
/// Implementations:
/// - `RecordingStatusSink` (test_utils)
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Deliver one status change.
    async fn notify(&self, change: StatusChange) -> Result<()>;
}
