//! In-memory implementations of the storage interfaces.
//!
//! The booking store keeps one lock per booking so transitions for the
//! same booking serialize while cross-booking operations run in parallel.
//! The ledger is a guarded append-only vector; balances are folded from
//! the log on demand.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::ledger::{NewTransaction, TransactionType, WalletTransaction};
use crate::interfaces::booking_store::{
    BookingStore, Result as StoreResult, StoreError, TransitionFields,
};
use crate::interfaces::ledger_recorder::{LedgerError, LedgerRecorder, Result as LedgerResult};

/// Booking store backed by a hash map of per-entry locks.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<Uuid, Arc<RwLock<Booking>>>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, id: Uuid) -> StoreResult<Arc<RwLock<Booking>>> {
        self.bookings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, booking: Booking) -> StoreResult<Uuid> {
        let id = booking.id;
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&id) {
            return Err(StoreError::DuplicateId { id });
        }
        bookings.insert(id, Arc::new(RwLock::new(booking)));

        debug!(booking_id = %id, "Booking created");
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Booking> {
        let entry = self.entry(id).await?;
        let booking = entry.read().await;
        Ok(booking.clone())
    }

    async fn transition(
        &self,
        id: Uuid,
        target: BookingStatus,
        fields: TransitionFields,
    ) -> StoreResult<Booking> {
        let entry = self.entry(id).await?;

        // The entry write lock is the per-booking serialization point:
        // the status check and every field write commit as one unit.
        let mut booking = entry.write().await;
        if !booking.status.can_transition_to(target) {
            return Err(StoreError::InvalidTransition {
                from: booking.status,
                to: target,
            });
        }

        booking.status = target;
        if let Some(payment_status) = fields.payment_status {
            booking.payment_status = payment_status;
        }
        if let Some(validated_at) = fields.validated_at {
            booking.validated_at = Some(validated_at);
        }
        if let Some(payment_id) = fields.payment_id {
            booking.payment_id = Some(payment_id);
        }
        if let Some(refund_id) = fields.refund_id {
            booking.refund_id = Some(refund_id);
        }

        debug!(booking_id = %id, status = %target, "Booking transitioned");
        Ok(booking.clone())
    }

    async fn list_active(&self) -> StoreResult<Vec<Booking>> {
        let entries: Vec<Arc<RwLock<Booking>>> =
            self.bookings.read().await.values().cloned().collect();

        let mut active = Vec::new();
        for entry in entries {
            let booking = entry.read().await;
            if !booking.status.is_terminal() {
                active.push(booking.clone());
            }
        }
        Ok(active)
    }
}

/// Append-only in-memory transaction log.
#[derive(Default)]
pub struct InMemoryLedger {
    entries: RwLock<Vec<WalletTransaction>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries in the log, across all owners.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl LedgerRecorder for InMemoryLedger {
    async fn record(&self, tx: NewTransaction) -> LedgerResult<WalletTransaction> {
        if tx.amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(tx.amount));
        }

        let entry = WalletTransaction {
            id: Uuid::new_v4(),
            owner_id: tx.owner_id,
            tx_type: tx.tx_type,
            amount: tx.amount,
            date: Utc::now(),
            reference: tx.reference,
            booking_ref: tx.booking_ref,
        };

        self.entries.write().await.push(entry.clone());

        debug!(
            transaction_id = %entry.id,
            owner_id = %entry.owner_id,
            tx_type = %entry.tx_type,
            amount = %entry.amount,
            "Ledger entry appended"
        );
        Ok(entry)
    }

    async fn find_by_booking(&self, booking: Uuid) -> LedgerResult<Option<WalletTransaction>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|e| e.tx_type == TransactionType::Earning && e.booking_ref == Some(booking))
            .cloned())
    }

    async fn transactions_for(&self, owner: Uuid) -> LedgerResult<Vec<WalletTransaction>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn balance_of(&self, owner: Uuid) -> LedgerResult<Decimal> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.owner_id == owner)
            .fold(Decimal::ZERO, |acc, e| acc + e.tx_type.signed(e.amount)))
    }
}
