//! Retry utilities: backoff builders and retryable error classification.
//!
//! Uses `backon` for exponential backoff with jitter. Provides the
//! standard backoff configuration for payment-capture attempts.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::config::SettlementConfig;
use crate::interfaces::payment_gateway::CaptureError;

/// Backoff for payment-capture retries, built from configuration.
///
/// Defaults (see [`SettlementConfig`]):
/// - Min delay: 100ms
/// - Max delay: 2s
/// - Max attempts: 3
/// - Jitter enabled
pub fn capture_backoff(config: &SettlementConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(config.capture_min_delay_ms))
        .with_max_delay(Duration::from_millis(config.capture_max_delay_ms))
        .with_max_times(config.capture_max_attempts)
        .with_jitter()
}

/// Determines if a capture error is retryable.
///
/// Retryable:
/// - `Retryable`: timeouts and server errors; another attempt may succeed
///
/// Non-retryable:
/// - `Terminal`: declined or invalid instrument. These will never succeed
///   on retry and are surfaced to the caller with the booking left
///   `confirmed` for a later fresh scan.
pub fn is_retryable(err: &CaptureError) -> bool {
    matches!(err, CaptureError::Retryable(_))
}
