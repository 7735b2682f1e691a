//! Derived, time-based presence status.
//!
//! Presence is a display label recomputed from booking time and current
//! booking state. It is never the source of truth for booking state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::booking::BookingStatus;

/// Ephemeral display status for a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresenceStatus {
    Upcoming,
    Starting,
    InProgress,
    Completed,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upcoming => write!(f, "upcoming"),
            Self::Starting => write!(f, "starting"),
            Self::InProgress => write!(f, "inProgress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Derive the presence status for a booking at a point in time.
///
/// A completed booking is always `Completed`. Otherwise the label follows
/// the clock: `Upcoming` until `starting_lead` before the scheduled start,
/// `Starting` inside the lead window, `InProgress` from the start onwards.
pub fn derive(
    scheduled_start: DateTime<Utc>,
    now: DateTime<Utc>,
    status: BookingStatus,
    starting_lead: Duration,
) -> PresenceStatus {
    if status == BookingStatus::Completed {
        return PresenceStatus::Completed;
    }
    if now < scheduled_start - starting_lead {
        PresenceStatus::Upcoming
    } else if now < scheduled_start {
        PresenceStatus::Starting
    } else {
        PresenceStatus::InProgress
    }
}
