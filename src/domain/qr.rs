//! Self-check-in QR payload.
//!
//! The payload is a JSON object carrying a type discriminator, the booking
//! it was generated for, and a generation timestamp. Scanners must check
//! the discriminator before trusting the payload, and reject payloads
//! outside the configured freshness window so an old QR cannot be
//! replayed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type discriminator expected in check-in payloads.
pub const CHECKIN_TYPE: &str = "lesson_checkin";

/// Allowance for scanner/issuer clock skew on future-dated payloads.
fn max_clock_skew() -> Duration {
    Duration::seconds(60)
}

/// Result type for payload parsing.
pub type Result<T> = std::result::Result<T, QrError>;

/// Reasons a QR payload is rejected.
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unexpected payload type '{0}'")]
    WrongType(String),

    #[error("payload is for booking {found}, scanned against {expected}")]
    BookingMismatch { expected: Uuid, found: Uuid },

    #[error("payload issued {age_minutes}min ago, older than the {max_minutes}min freshness window")]
    Stale { age_minutes: i64, max_minutes: i64 },

    #[error("payload issued in the future")]
    FutureDated,
}

/// JSON body of a check-in QR code.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub booking_id: Uuid,
    pub issued_at: DateTime<Utc>,
}

impl CheckinPayload {
    /// Issue a fresh payload for a booking.
    pub fn new(booking_id: Uuid, issued_at: DateTime<Utc>) -> Self {
        Self {
            kind: CHECKIN_TYPE.to_string(),
            booking_id,
            issued_at,
        }
    }

    /// Serialize to the JSON carried in the QR code.
    pub fn encode(&self) -> String {
        // Serialization of a plain struct cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse and validate raw QR data scanned against a booking.
    ///
    /// Checks, in order: JSON shape, type discriminator, booking match,
    /// freshness (no older than `max_age`, no further in the future than
    /// the clock-skew allowance). Any failure means the scan is rejected
    /// with no state change.
    pub fn parse(
        raw: &str,
        expected_booking: Uuid,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let payload: CheckinPayload = serde_json::from_str(raw)?;

        if payload.kind != CHECKIN_TYPE {
            return Err(QrError::WrongType(payload.kind));
        }
        if payload.booking_id != expected_booking {
            return Err(QrError::BookingMismatch {
                expected: expected_booking,
                found: payload.booking_id,
            });
        }

        let age = now - payload.issued_at;
        if age > max_age {
            return Err(QrError::Stale {
                age_minutes: age.num_minutes(),
                max_minutes: max_age.num_minutes(),
            });
        }
        if payload.issued_at > now + max_clock_skew() {
            return Err(QrError::FutureDated);
        }

        Ok(payload)
    }
}
