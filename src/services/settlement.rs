//! Settlement: QR-validated check-in that captures payment and completes
//! a booking.
//!
//! `validate` runs the whole sequence for one booking under a per-booking
//! lock, so concurrent scans produce exactly one capture and one ledger
//! entry; late scanners get the original result back as an idempotent
//! `already settled` response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{FeeConfig, SettlementConfig};
use crate::domain::booking::{Booking, BookingStatus, PaymentStatus};
use crate::domain::fees::{FeeBreakdown, FeeCalculator, FeeError};
use crate::domain::ledger::{NewTransaction, TransactionType};
use crate::domain::qr::{CheckinPayload, QrError};
use crate::interfaces::booking_store::{BookingStore, StoreError, TransitionFields};
use crate::interfaces::ledger_recorder::{LedgerError, LedgerRecorder};
use crate::interfaces::payment_gateway::{CaptureError, CaptureReceipt, PaymentGateway};
use crate::utils::retry;

/// Result type for settlement operations.
pub type Result<T> = std::result::Result<T, SettlementError>;

/// Local validation failures: reported immediately, no state change,
/// no retry.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid QR payload: {0}")]
    InvalidQr(#[from] QrError),

    #[error(
        "scan at {scanned_at} outside acceptance window for lesson scheduled {scheduled_start}"
    )]
    OutOfWindow {
        scheduled_start: DateTime<Utc>,
        scanned_at: DateTime<Utc>,
    },
}

/// Booking-state failures: reported immediately, no state change.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("booking is {status}, settlement requires a confirmed booking")]
    WrongState { status: BookingStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the settlement sequence.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("payment could not be completed: {message}")]
    PaymentCaptureFailed { retryable: bool, message: String },

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<StoreError> for SettlementError {
    fn from(e: StoreError) -> Self {
        SettlementError::State(StateError::Store(e))
    }
}

/// Scan request, stable wire shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    pub booking_id: Uuid,
    pub qr_code_data: String,
    pub scanned_by: String,
}

/// Payment portion of the settlement response.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub payment_intent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<String>,
    pub transaction_id: Uuid,
    pub gross_amount: Decimal,
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
    pub trainer_earning: Decimal,
}

/// Settlement response, stable wire shape.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub success: bool,
    pub message: String,
    pub booking: Booking,
    pub payment: PaymentSummary,
}

/// Orchestrates QR validation, fee computation, payment capture, the
/// completion transition and the ledger append.
pub struct SettlementService {
    store: Arc<dyn BookingStore>,
    ledger: Arc<dyn LedgerRecorder>,
    gateway: Arc<dyn PaymentGateway>,
    fees: FeeConfig,
    settlement: SettlementConfig,
    /// Per-booking serialization points for the validate sequence.
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SettlementService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        ledger: Arc<dyn LedgerRecorder>,
        gateway: Arc<dyn PaymentGateway>,
        fees: FeeConfig,
        settlement: SettlementConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            gateway,
            fees,
            settlement,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Validate a scan and settle the booking.
    ///
    /// Repeated scans of a settled booking are safe: they return the
    /// original settlement result, without touching the gateway or the
    /// ledger again. Retryable capture failures are retried with bounded
    /// backoff; terminal failures leave the booking `confirmed` so a
    /// fresh scan can be attempted later.
    #[tracing::instrument(
        name = "settlement.validate",
        skip_all,
        fields(booking_id = %req.booking_id, scanned_by = %req.scanned_by)
    )]
    pub async fn validate(&self, req: SettlementRequest) -> Result<SettlementResponse> {
        let now = Utc::now();

        // Local payload validation happens before any state is read.
        CheckinPayload::parse(
            &req.qr_code_data,
            req.booking_id,
            self.settlement.qr_max_age(),
            now,
        )
        .map_err(ValidationError::InvalidQr)?;

        // Everything from the state check to the ledger append runs
        // under the per-booking lock.
        let lock = self.booking_lock(req.booking_id).await;
        let _guard = lock.lock().await;

        let booking = self.store.get(req.booking_id).await?;

        if booking.status == BookingStatus::Completed {
            return self.already_settled(booking).await;
        }
        if booking.status != BookingStatus::Confirmed {
            return Err(StateError::WrongState {
                status: booking.status,
            }
            .into());
        }

        let window_open = booking.scheduled_start - self.settlement.early_grace();
        let window_close = booking.scheduled_start + self.settlement.late_grace();
        if now < window_open || now > window_close {
            return Err(ValidationError::OutOfWindow {
                scheduled_start: booking.scheduled_start,
                scanned_at: now,
            }
            .into());
        }

        let split = FeeCalculator::compute(booking.total_amount, self.fees.platform_rate)?;

        let receipt = self.capture_with_retry(booking.id, split.gross_amount).await?;

        let updated = self
            .store
            .transition(
                booking.id,
                BookingStatus::Completed,
                TransitionFields {
                    payment_status: Some(PaymentStatus::Captured),
                    validated_at: Some(now),
                    payment_id: Some(receipt.payment_intent_id.clone()),
                    refund_id: None,
                },
            )
            .await?;

        // Ledger append strictly after the transition commit.
        let entry = self
            .ledger
            .record(NewTransaction {
                owner_id: booking.instructor_id,
                tx_type: TransactionType::Earning,
                amount: split.net_amount,
                reference: Some(receipt.payment_intent_id.clone()),
                booking_ref: Some(booking.id),
            })
            .await?;

        info!(
            gross = %split.gross_amount,
            fee = %split.platform_fee,
            net = %split.net_amount,
            payment_intent_id = %receipt.payment_intent_id,
            "Booking settled"
        );

        Ok(Self::response(
            "settlement completed",
            updated,
            &split,
            receipt,
            entry.id,
        ))
    }

    /// Rebuild the original settlement result for a repeated scan.
    async fn already_settled(&self, booking: Booking) -> Result<SettlementResponse> {
        let entry = self
            .ledger
            .find_by_booking(booking.id)
            .await?
            .ok_or(LedgerError::MissingEntry {
                booking: booking.id,
            })?;

        let gross = booking.total_amount;
        let split = FeeBreakdown {
            gross_amount: gross,
            platform_fee: gross - entry.amount,
            net_amount: entry.amount,
        };
        let receipt = CaptureReceipt {
            payment_intent_id: booking.payment_id.clone().unwrap_or_default(),
            transfer_id: None,
        };

        info!("Repeated scan for settled booking, returning original result");

        Ok(Self::response(
            "booking already settled",
            booking,
            &split,
            receipt,
            entry.id,
        ))
    }

    /// Capture with per-attempt timeout and bounded exponential backoff.
    ///
    /// A timed-out attempt counts as retryable. Terminal gateway errors
    /// and exhausted retries surface as `PaymentCaptureFailed`.
    async fn capture_with_retry(&self, booking_id: Uuid, amount: Decimal) -> Result<CaptureReceipt> {
        (|| async {
            match tokio::time::timeout(
                self.settlement.capture_timeout(),
                self.gateway.capture(booking_id, amount),
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(CaptureError::Retryable("capture timed out".to_string())),
            }
        })
        .retry(retry::capture_backoff(&self.settlement))
        .when(retry::is_retryable)
        .notify(|err: &CaptureError, delay: Duration| {
            warn!(
                booking_id = %booking_id,
                error = %err,
                retry_in = ?delay,
                "Capture attempt failed, retrying"
            );
        })
        .await
        .map_err(|e| SettlementError::PaymentCaptureFailed {
            retryable: retry::is_retryable(&e),
            message: e.to_string(),
        })
    }

    async fn booking_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn response(
        message: &str,
        booking: Booking,
        split: &FeeBreakdown,
        receipt: CaptureReceipt,
        transaction_id: Uuid,
    ) -> SettlementResponse {
        SettlementResponse {
            success: true,
            message: message.to_string(),
            booking,
            payment: PaymentSummary {
                payment_intent_id: receipt.payment_intent_id,
                transfer_id: receipt.transfer_id,
                transaction_id,
                gross_amount: split.gross_amount,
                platform_fee: split.platform_fee,
                net_amount: split.net_amount,
                trainer_earning: split.net_amount,
            },
        }
    }
}
