//! End-to-end settlement scenarios over the in-memory stores.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use courtbook::config::{FeeConfig, SettlementConfig};
use courtbook::domain::booking::{Booking, BookingStatus, PaymentStatus};
use courtbook::domain::ledger::TransactionType;
use courtbook::domain::qr::CheckinPayload;
use courtbook::interfaces::booking_store::BookingStore;
use courtbook::interfaces::ledger_recorder::LedgerRecorder;
use courtbook::services::{
    SettlementError, SettlementRequest, SettlementService, StateError,
};
use courtbook::storage::memory::{InMemoryBookingStore, InMemoryLedger};
use courtbook::test_utils::{confirmed_booking, MockPaymentGateway};

struct Harness {
    store: Arc<InMemoryBookingStore>,
    ledger: Arc<InMemoryLedger>,
    gateway: Arc<MockPaymentGateway>,
    service: Arc<SettlementService>,
}

fn harness() -> Harness {
    harness_with(MockPaymentGateway::new(), FeeConfig::default())
}

fn harness_with(gateway: MockPaymentGateway, fees: FeeConfig) -> Harness {
    let store = Arc::new(InMemoryBookingStore::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let gateway = Arc::new(gateway);
    let settlement = SettlementConfig {
        capture_timeout_secs: 1,
        capture_min_delay_ms: 1,
        capture_max_delay_ms: 5,
        ..SettlementConfig::default()
    };
    let service = Arc::new(SettlementService::new(
        store.clone(),
        ledger.clone(),
        gateway.clone(),
        fees,
        settlement,
    ));
    Harness {
        store,
        ledger,
        gateway,
        service,
    }
}

async fn seed_confirmed(h: &Harness, amount: Decimal) -> Booking {
    let booking = confirmed_booking(amount, Utc::now());
    h.store.create(booking.clone()).await.unwrap();
    booking
}

fn scan_request(booking: &Booking) -> SettlementRequest {
    SettlementRequest {
        booking_id: booking.id,
        qr_code_data: CheckinPayload::new(booking.id, Utc::now()).encode(),
        scanned_by: "instructor-app".to_string(),
    }
}

#[tokio::test]
async fn settles_confirmed_booking_with_ten_percent_fee() {
    let h = harness();
    let booking = seed_confirmed(&h, dec!(45.00)).await;

    let response = h.service.validate(scan_request(&booking)).await.unwrap();

    assert!(response.success);
    assert_eq!(response.payment.gross_amount, dec!(45.00));
    assert_eq!(response.payment.platform_fee, dec!(4.50));
    assert_eq!(response.payment.net_amount, dec!(40.50));
    assert_eq!(response.payment.trainer_earning, dec!(40.50));

    let settled = h.store.get(booking.id).await.unwrap();
    assert_eq!(settled.status, BookingStatus::Completed);
    assert_eq!(settled.payment_status, PaymentStatus::Captured);
    assert!(settled.validated_at.is_some());
    assert_eq!(
        settled.payment_id.as_deref(),
        Some(response.payment.payment_intent_id.as_str())
    );

    // Exactly one earning entry of the net amount.
    assert_eq!(h.ledger.len().await, 1);
    let entry = h
        .ledger
        .find_by_booking(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.tx_type, TransactionType::Earning);
    assert_eq!(entry.amount, dec!(40.50));
    assert_eq!(entry.owner_id, booking.instructor_id);
}

#[tokio::test]
async fn second_scan_is_idempotent() {
    let h = harness();
    let booking = seed_confirmed(&h, dec!(45.00)).await;

    let first = h.service.validate(scan_request(&booking)).await.unwrap();
    let second = h.service.validate(scan_request(&booking)).await.unwrap();

    assert!(second.success);
    assert_eq!(second.message, "booking already settled");
    assert_eq!(second.payment.transaction_id, first.payment.transaction_id);
    assert_eq!(second.payment.net_amount, dec!(40.50));

    // Ledger unchanged: still one entry, one capture.
    assert_eq!(h.ledger.len().await, 1);
    assert_eq!(h.gateway.capture_count(), 1);
}

#[tokio::test]
async fn pending_booking_cannot_be_settled() {
    let h = harness();
    let mut booking = confirmed_booking(dec!(30.00), Utc::now());
    booking.status = BookingStatus::Pending;
    h.store.create(booking.clone()).await.unwrap();

    let result = h.service.validate(scan_request(&booking)).await;

    assert!(matches!(
        result,
        Err(SettlementError::State(StateError::WrongState {
            status: BookingStatus::Pending
        }))
    ));

    let unchanged = h.store.get(booking.id).await.unwrap();
    assert_eq!(unchanged.status, BookingStatus::Pending);
    assert_eq!(unchanged.payment_status, PaymentStatus::Authorized);
    assert!(h.ledger.is_empty().await);
    assert_eq!(h.gateway.capture_count(), 0);
}

#[tokio::test]
async fn promotional_zero_rate_credits_full_amount() {
    let h = harness_with(
        MockPaymentGateway::new(),
        FeeConfig {
            platform_rate: dec!(0),
        },
    );
    let booking = seed_confirmed(&h, dec!(50.00)).await;

    let response = h.service.validate(scan_request(&booking)).await.unwrap();

    assert_eq!(response.payment.platform_fee, dec!(0));
    assert_eq!(response.payment.net_amount, dec!(50.00));

    let entry = h
        .ledger
        .find_by_booking(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.amount, dec!(50.00));
}

#[tokio::test]
async fn concurrent_scans_capture_exactly_once() {
    let h = harness();
    let booking = seed_confirmed(&h, dec!(45.00)).await;

    let scans = (0..8).map(|_| {
        let service = h.service.clone();
        let request = scan_request(&booking);
        tokio::spawn(async move { service.validate(request).await })
    });
    let results: Vec<_> = join_all(scans)
        .await
        .into_iter()
        .map(|join| join.unwrap())
        .collect();

    // Every scan succeeds; exactly one performed the settlement, the
    // rest observed the already-settled result.
    let mut settled = 0;
    let mut replayed = 0;
    for result in results {
        let response = result.unwrap();
        assert!(response.success);
        assert_eq!(response.payment.net_amount, dec!(40.50));
        match response.message.as_str() {
            "settlement completed" => settled += 1,
            "booking already settled" => replayed += 1,
            other => panic!("unexpected message: {other}"),
        }
    }
    assert_eq!(settled, 1);
    assert_eq!(replayed, 7);

    // One capture, one transition, one ledger entry.
    assert_eq!(h.gateway.capture_count(), 1);
    assert_eq!(h.ledger.len().await, 1);
    assert_eq!(
        h.store.get(booking.id).await.unwrap().status,
        BookingStatus::Completed
    );
}

#[tokio::test]
async fn terminal_capture_failure_allows_a_later_rescan() {
    let h = harness_with(MockPaymentGateway::terminal_failure(), FeeConfig::default());
    let booking = seed_confirmed(&h, dec!(45.00)).await;

    let first = h.service.validate(scan_request(&booking)).await;
    assert!(matches!(
        first,
        Err(SettlementError::PaymentCaptureFailed {
            retryable: false,
            ..
        })
    ));
    assert_eq!(
        h.store.get(booking.id).await.unwrap().status,
        BookingStatus::Confirmed
    );
    assert!(h.ledger.is_empty().await);

    // The gateway recovers; a fresh scan settles normally.
    h.gateway.set_terminal(false).await;
    let retry = h.service.validate(scan_request(&booking)).await.unwrap();
    assert!(retry.success);
    assert_eq!(
        h.store.get(booking.id).await.unwrap().status,
        BookingStatus::Completed
    );
    assert_eq!(h.ledger.len().await, 1);
}

#[tokio::test]
async fn settled_earnings_show_up_in_derived_balance() {
    let h = harness();
    let booking = seed_confirmed(&h, dec!(45.00)).await;
    h.service.validate(scan_request(&booking)).await.unwrap();

    assert_eq!(
        h.ledger.balance_of(booking.instructor_id).await.unwrap(),
        dec!(40.50)
    );
}
