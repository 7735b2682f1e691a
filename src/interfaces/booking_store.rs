//! Booking state storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingStatus, PaymentStatus};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("booking not found: {id}")]
    NotFound { id: Uuid },

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking already exists: {id}")]
    DuplicateId { id: Uuid },
}

/// Fields applied together with a status transition.
///
/// A transition is atomic: the target status and every populated field
/// here apply fully or not at all.
#[derive(Clone, Debug, Default)]
pub struct TransitionFields {
    pub payment_status: Option<PaymentStatus>,
    pub validated_at: Option<DateTime<Utc>>,
    pub payment_id: Option<String>,
    pub refund_id: Option<String>,
}

/// Interface for authoritative booking state.
///
/// The store arbitrates all booking mutation: transitions are validated
/// against the lifecycle graph and serialize per booking, so concurrent
/// readers never observe a partial write.
///
/// Implementations:
/// - `InMemoryBookingStore`: per-entry lock over a hash map
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a new booking. Fails with `DuplicateId` if the id exists.
    async fn create(&self, booking: Booking) -> Result<Uuid>;

    /// Fetch a booking by id.
    async fn get(&self, id: Uuid) -> Result<Booking>;

    /// Apply a guarded transition.
    ///
    /// Fails with `InvalidTransition` when the edge
    /// `current -> target` is not in the lifecycle graph, leaving the
    /// booking unchanged.
    async fn transition(
        &self,
        id: Uuid,
        target: BookingStatus,
        fields: TransitionFields,
    ) -> Result<Booking>;

    /// All bookings whose status is non-terminal.
    async fn list_active(&self) -> Result<Vec<Booking>>;
}
