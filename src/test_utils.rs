//! Test utilities and mock implementations.
//!
//! This module provides mock implementations of the external collaborator
//! traits for testing without a real gateway or push channel, plus a few
//! booking fixtures.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingStatus};
use crate::interfaces::payment_gateway::{CaptureError, CaptureReceipt, PaymentGateway};
use crate::interfaces::status_sink::{Result as SinkResult, SinkError, StatusChange, StatusSink};

/// Mock payment gateway with scripted failures and a capture counter.
#[derive(Default)]
pub struct MockPaymentGateway {
    capture_calls: AtomicUsize,
    /// Remaining attempts that fail with a retryable error.
    retryable_failures: AtomicUsize,
    /// When set, every attempt fails terminally.
    terminal: RwLock<bool>,
}

impl MockPaymentGateway {
    /// Gateway that succeeds on every capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway that fails the first `n` attempts with a retryable error,
    /// then succeeds.
    pub fn with_retryable_failures(n: usize) -> Self {
        let gateway = Self::default();
        gateway.retryable_failures.store(n, Ordering::SeqCst);
        gateway
    }

    /// Gateway that declines every capture.
    pub fn terminal_failure() -> Self {
        Self {
            terminal: RwLock::new(true),
            ..Self::default()
        }
    }

    /// Switch terminal failures on or off.
    pub async fn set_terminal(&self, fail: bool) {
        *self.terminal.write().await = fail;
    }

    /// Number of capture attempts observed.
    pub fn capture_count(&self) -> usize {
        self.capture_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn capture(
        &self,
        booking_id: Uuid,
        _amount: Decimal,
    ) -> std::result::Result<CaptureReceipt, CaptureError> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);

        if *self.terminal.read().await {
            return Err(CaptureError::Terminal("card declined".to_string()));
        }

        let remaining = self.retryable_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.retryable_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(CaptureError::Retryable("gateway timeout".to_string()));
        }

        Ok(CaptureReceipt {
            payment_intent_id: format!("pi_{}", booking_id.simple()),
            transfer_id: Some(format!("tr_{}", booking_id.simple())),
        })
    }
}

/// Status sink that records every delivered change.
#[derive(Default)]
pub struct RecordingStatusSink {
    changes: RwLock<Vec<StatusChange>>,
    fail: RwLock<bool>,
}

impl RecordingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Drain the recorded changes.
    pub async fn take(&self) -> Vec<StatusChange> {
        std::mem::take(&mut *self.changes.write().await)
    }
}

#[async_trait]
impl StatusSink for RecordingStatusSink {
    async fn notify(&self, change: StatusChange) -> SinkResult<()> {
        if *self.fail.read().await {
            return Err(SinkError::Delivery("mock delivery failure".to_string()));
        }
        self.changes.write().await.push(change);
        Ok(())
    }
}

/// A confirmed booking with authorized funds, ready to settle.
pub fn confirmed_booking(total_amount: Decimal, scheduled_start: DateTime<Utc>) -> Booking {
    let mut booking = Booking::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        scheduled_start,
        total_amount,
    );
    booking.status = BookingStatus::Confirmed;
    booking
}
