//! External payment-capture collaborator interface.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Errors from a capture attempt.
///
/// The split drives retry policy: `Retryable` failures (timeouts, server
/// errors) are retried with bounded backoff; `Terminal` failures
/// (declined, invalid instrument) are surfaced immediately.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("retryable capture failure: {0}")]
    Retryable(String),

    #[error("terminal capture failure: {0}")]
    Terminal(String),
}

/// Proof of a successful capture.
#[derive(Clone, Debug)]
pub struct CaptureReceipt {
    pub payment_intent_id: String,
    /// Transfer to the instructor's connected account, when the gateway
    /// splits at capture time.
    pub transfer_id: Option<String>,
}

/// Interface to the payment gateway.
///
/// Implementations:
/// - `MockPaymentGateway` (test_utils): scripted failures and counters
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Capture the authorized funds for a booking.
    async fn capture(
        &self,
        booking_id: Uuid,
        amount: Decimal,
    ) -> std::result::Result<CaptureReceipt, CaptureError>;
}
