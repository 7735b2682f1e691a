//! courtbook-standalone: all-in-one demo host
//!
//! Runs the whole core in a single process against in-memory storage and
//! a mock payment gateway: seeds a few bookings, starts the presence
//! scheduler, settles one booking through a scanned QR payload, records
//! an external withdrawal, and prints the derived wallet balance.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::info;

use courtbook::config::Config;
use courtbook::domain::booking::{Booking, BookingStatus};
use courtbook::domain::ledger::{NewTransaction, TransactionType};
use courtbook::domain::qr::CheckinPayload;
use courtbook::interfaces::booking_store::{BookingStore, TransitionFields};
use courtbook::interfaces::ledger_recorder::LedgerRecorder;
use courtbook::interfaces::status_sink::{Result as SinkResult, StatusChange, StatusSink};
use courtbook::services::{PresenceScheduler, SettlementRequest, SettlementService};
use courtbook::storage::memory::{InMemoryBookingStore, InMemoryLedger};
use courtbook::test_utils::MockPaymentGateway;
use courtbook::utils::bootstrap::init_tracing;

/// Sink that renders status changes to the log.
struct LoggingSink;

#[async_trait]
impl StatusSink for LoggingSink {
    async fn notify(&self, change: StatusChange) -> SinkResult<()> {
        info!(
            booking_id = %change.booking_id,
            previous = ?change.previous,
            current = %change.current,
            "Presence update"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load()?;

    let store = Arc::new(InMemoryBookingStore::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let gateway = Arc::new(MockPaymentGateway::new());

    // Seed: one lesson starting shortly, one later today.
    let soon = seed_confirmed(&store, Utc::now() + Duration::minutes(2), "45.00").await?;
    seed_confirmed(&store, Utc::now() + Duration::hours(3), "60.00").await?;

    // Presence scheduler with a logging sink.
    let scheduler = Arc::new(PresenceScheduler::new(
        store.clone(),
        Arc::new(LoggingSink),
        config.scheduler.clone(),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run(shutdown_rx).await })
    };

    // Settle the imminent lesson with a freshly issued QR payload.
    let settlement = SettlementService::new(
        store.clone(),
        ledger.clone(),
        gateway,
        config.fees.clone(),
        config.settlement.clone(),
    );
    let response = settlement
        .validate(SettlementRequest {
            booking_id: soon.id,
            qr_code_data: CheckinPayload::new(soon.id, Utc::now()).encode(),
            scanned_by: "standalone-demo".to_string(),
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    // An external payout process appends withdrawals through the same
    // ledger contract.
    ledger
        .record(NewTransaction {
            owner_id: soon.instructor_id,
            tx_type: TransactionType::Withdrawal,
            amount: Decimal::new(2000, 2),
            reference: Some("payout-batch-demo".to_string()),
            booking_ref: None,
        })
        .await?;

    let balance = ledger.balance_of(soon.instructor_id).await?;
    info!(instructor_id = %soon.instructor_id, balance = %balance, "Derived wallet balance");

    shutdown_tx.send(true)?;
    scheduler_task.await?;

    Ok(())
}

async fn seed_confirmed(
    store: &InMemoryBookingStore,
    scheduled_start: chrono::DateTime<Utc>,
    amount: &str,
) -> Result<Booking, Box<dyn std::error::Error>> {
    let booking = Booking::new(
        uuid::Uuid::new_v4(),
        uuid::Uuid::new_v4(),
        uuid::Uuid::new_v4(),
        scheduled_start,
        amount.parse()?,
    );
    let id = store.create(booking).await?;
    let confirmed = store
        .transition(id, BookingStatus::Confirmed, TransitionFields::default())
        .await?;
    Ok(confirmed)
}
