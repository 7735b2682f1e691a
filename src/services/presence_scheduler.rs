//! Presence scheduler: periodic derived status for active bookings.
//!
//! Runs one sweep task over all non-terminal bookings at a fixed
//! interval. On each tick the presence status is recomputed per booking
//! and a notification is emitted only when it changed since the previous
//! tick. Emissions are best-effort: a failed delivery is dropped and the
//! next tick self-corrects. The scheduler never writes booking state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::domain::booking::BookingStatus;
use crate::domain::presence::{self, PresenceStatus};
use crate::interfaces::booking_store::BookingStore;
use crate::interfaces::status_sink::{StatusChange, StatusSink};

/// Periodic presence sweep over active bookings.
pub struct PresenceScheduler {
    store: Arc<dyn BookingStore>,
    sink: Arc<dyn StatusSink>,
    config: SchedulerConfig,
}

impl PresenceScheduler {
    pub fn new(
        store: Arc<dyn BookingStore>,
        sink: Arc<dyn StatusSink>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    /// Run the sweep loop until the shutdown signal fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            tick_interval = ?self.config.tick_interval(),
            starting_lead = ?self.config.starting_lead(),
            "Starting presence scheduler"
        );

        let mut ticker = interval(self.config.tick_interval());
        let mut last_emitted: HashMap<Uuid, PresenceStatus> = HashMap::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep(&mut last_emitted).await;
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Presence scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One pass: recompute presence for every active booking, emit
    /// changes, and retire bookings that reached a terminal status.
    pub(crate) async fn sweep(&self, last_emitted: &mut HashMap<Uuid, PresenceStatus>) {
        let now = Utc::now();

        let active = match self.store.list_active().await {
            Ok(active) => active,
            Err(e) => {
                warn!(error = %e, "Failed to list active bookings, skipping tick");
                return;
            }
        };

        let mut seen: HashSet<Uuid> = HashSet::with_capacity(active.len());
        for booking in active {
            seen.insert(booking.id);

            let current = presence::derive(
                booking.scheduled_start,
                now,
                booking.status,
                self.config.starting_lead(),
            );
            let previous = last_emitted.get(&booking.id).copied();
            if previous != Some(current) {
                // Only advance the tracked status on successful delivery,
                // so a dropped emission is retried on the next tick.
                if self.emit(booking.id, previous, current).await {
                    last_emitted.insert(booking.id, current);
                }
            }
        }

        // Bookings that left the active set: a settled one gets a final
        // `completed` emission; tracking ends either way.
        let gone: Vec<Uuid> = last_emitted
            .keys()
            .filter(|id| !seen.contains(*id))
            .copied()
            .collect();
        for id in gone {
            let previous = last_emitted.get(&id).copied();
            match self.store.get(id).await {
                Ok(booking) if booking.status == BookingStatus::Completed => {
                    if self.emit(id, previous, PresenceStatus::Completed).await {
                        last_emitted.remove(&id);
                    }
                }
                Ok(booking) => {
                    debug!(booking_id = %id, status = %booking.status, "Booking left active set");
                    last_emitted.remove(&id);
                }
                Err(e) => {
                    warn!(booking_id = %id, error = %e, "Failed to load retired booking");
                    last_emitted.remove(&id);
                }
            }
        }
    }

    async fn emit(
        &self,
        booking_id: Uuid,
        previous: Option<PresenceStatus>,
        current: PresenceStatus,
    ) -> bool {
        debug!(
            booking_id = %booking_id,
            previous = ?previous,
            current = %current,
            "Presence status changed"
        );

        let change = StatusChange {
            booking_id,
            previous,
            current,
            at: Utc::now(),
        };
        match self.sink.notify(change).await {
            Ok(()) => true,
            Err(e) => {
                // Best-effort delivery: the next tick self-corrects.
                warn!(booking_id = %booking_id, error = %e, "Failed to deliver status change");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::Booking;
    use crate::interfaces::booking_store::TransitionFields;
    use crate::storage::memory::InMemoryBookingStore;
    use crate::test_utils::{confirmed_booking, RecordingStatusSink};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn scheduler(
        store: Arc<InMemoryBookingStore>,
        sink: Arc<RecordingStatusSink>,
    ) -> PresenceScheduler {
        PresenceScheduler::new(store, sink, SchedulerConfig::default())
    }

    async fn seed(store: &InMemoryBookingStore, start_offset: Duration) -> Booking {
        let booking = confirmed_booking(dec!(30.00), Utc::now() + start_offset);
        store.create(booking.clone()).await.unwrap();
        booking
    }

    #[tokio::test]
    async fn test_sweep_emits_once_per_status() {
        let store = Arc::new(InMemoryBookingStore::new());
        let sink = Arc::new(RecordingStatusSink::new());
        let booking = seed(&store, Duration::minutes(30)).await;
        let sched = scheduler(store.clone(), sink.clone());

        let mut last = HashMap::new();
        sched.sweep(&mut last).await;
        sched.sweep(&mut last).await;
        sched.sweep(&mut last).await;

        // Status did not change between ticks, so exactly one emission.
        let changes = sink.take().await;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].booking_id, booking.id);
        assert_eq!(changes[0].current, PresenceStatus::Upcoming);
        assert_eq!(changes[0].previous, None);
    }

    #[tokio::test]
    async fn test_sweep_tracks_status_progression() {
        let store = Arc::new(InMemoryBookingStore::new());
        let sink = Arc::new(RecordingStatusSink::new());
        // Already inside the starting lead window.
        let booking = seed(&store, Duration::minutes(2)).await;
        let sched = scheduler(store.clone(), sink.clone());

        let mut last = HashMap::new();
        sched.sweep(&mut last).await;

        let changes = sink.take().await;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].current, PresenceStatus::Starting);
        assert_eq!(last.get(&booking.id), Some(&PresenceStatus::Starting));
    }

    #[tokio::test]
    async fn test_completed_booking_gets_final_emission_then_retires() {
        let store = Arc::new(InMemoryBookingStore::new());
        let sink = Arc::new(RecordingStatusSink::new());
        let booking = seed(&store, Duration::minutes(-10)).await;
        let sched = scheduler(store.clone(), sink.clone());

        let mut last = HashMap::new();
        sched.sweep(&mut last).await;
        assert_eq!(sink.take().await[0].current, PresenceStatus::InProgress);

        store
            .transition(
                booking.id,
                BookingStatus::Completed,
                TransitionFields {
                    payment_status: Some(crate::domain::booking::PaymentStatus::Captured),
                    validated_at: Some(Utc::now()),
                    payment_id: Some("pi_1".into()),
                    refund_id: None,
                },
            )
            .await
            .unwrap();

        sched.sweep(&mut last).await;
        let changes = sink.take().await;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].current, PresenceStatus::Completed);
        assert_eq!(changes[0].previous, Some(PresenceStatus::InProgress));
        assert!(last.is_empty());

        // Retired: further sweeps emit nothing for it.
        sched.sweep(&mut last).await;
        assert!(sink.take().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_booking_retires_silently() {
        let store = Arc::new(InMemoryBookingStore::new());
        let sink = Arc::new(RecordingStatusSink::new());
        let booking = seed(&store, Duration::minutes(30)).await;
        let sched = scheduler(store.clone(), sink.clone());

        let mut last = HashMap::new();
        sched.sweep(&mut last).await;
        sink.take().await;

        store
            .transition(booking.id, BookingStatus::Cancelled, TransitionFields::default())
            .await
            .unwrap();

        sched.sweep(&mut last).await;
        assert!(sink.take().await.is_empty());
        assert!(last.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_emission_retried_on_next_tick() {
        let store = Arc::new(InMemoryBookingStore::new());
        let sink = Arc::new(RecordingStatusSink::new());
        sink.set_fail(true).await;
        let booking = seed(&store, Duration::minutes(30)).await;
        let sched = scheduler(store.clone(), sink.clone());

        let mut last = HashMap::new();
        sched.sweep(&mut last).await;

        // Emission was dropped; the tracked status did not advance.
        assert!(sink.take().await.is_empty());
        assert!(last.is_empty());

        sink.set_fail(false).await;
        sched.sweep(&mut last).await;

        let changes = sink.take().await;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].booking_id, booking.id);
        assert_eq!(changes[0].current, PresenceStatus::Upcoming);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = Arc::new(InMemoryBookingStore::new());
        let sink = Arc::new(RecordingStatusSink::new());
        let config = SchedulerConfig {
            tick_interval_secs: 1,
            ..SchedulerConfig::default()
        };
        let sched = Arc::new(PresenceScheduler::new(store, sink, config));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = {
            let sched = sched.clone();
            tokio::spawn(async move { sched.run(shutdown_rx).await })
        };

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("scheduler did not stop on shutdown")
            .unwrap();
    }
}
