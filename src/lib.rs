//! Courtbook - booking lifecycle and settlement core
//!
//! The state machine that governs a sport-lesson booking from creation to
//! a QR-validated, fee-settled completion, plus the time-driven presence
//! status used for "starting / in progress" indicators.
//!
//! - [`interfaces`] holds the contracts: booking store, ledger recorder,
//!   payment gateway, status sink.
//! - [`services::SettlementService`] serializes settlement per booking so
//!   concurrent scans capture payment exactly once.
//! - [`services::PresenceScheduler`] periodically derives presence from
//!   booking time and state, emitting only on change.

pub mod config;
pub mod domain;
pub mod interfaces;
pub mod services;
pub mod storage;
pub mod test_utils;
pub mod utils;
