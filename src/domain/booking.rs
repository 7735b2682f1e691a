//! Booking aggregate: lifecycle status, payment state, transition graph.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a booking.
///
/// The allowed transition graph:
/// - `Pending -> Confirmed | Cancelled`
/// - `Confirmed -> Completed | Cancelled | Refunded | NoShow`
///
/// `Completed`, `Cancelled`, `Refunded` and `NoShow` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Refunded,
    NoShow,
}

impl BookingStatus {
    /// Whether this status has no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Refunded | Self::NoShow
        )
    }

    /// Whether the edge `self -> target` is in the transition graph.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, target),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, Refunded)
                | (Confirmed, NoShow)
        )
    }

    /// All status values, for exhaustive checks.
    pub fn all() -> [BookingStatus; 6] {
        use BookingStatus::*;
        [Pending, Confirmed, Completed, Cancelled, Refunded, NoShow]
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Refunded => write!(f, "refunded"),
            Self::NoShow => write!(f, "noShow"),
        }
    }
}

/// Payment state of the funds backing a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentStatus {
    Authorized,
    Captured,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authorized => write!(f, "authorized"),
            Self::Captured => write!(f, "captured"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

/// A single scheduled lesson reservation.
///
/// `total_amount` is immutable once set. A `Completed` booking always has
/// `payment_status == Captured` and `validated_at` populated.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub instructor_id: Uuid,
    pub student_id: Uuid,
    pub scheduled_start: DateTime<Utc>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Create a new pending booking with authorized funds.
    pub fn new(
        lesson_id: Uuid,
        instructor_id: Uuid,
        student_id: Uuid,
        scheduled_start: DateTime<Utc>,
        total_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            lesson_id,
            instructor_id,
            student_id,
            scheduled_start,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Authorized,
            total_amount,
            payment_id: None,
            refund_id: None,
            validated_at: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this booking has been settled.
    pub fn is_settled(&self) -> bool {
        self.status == BookingStatus::Completed
    }
}
