//! Abstract interfaces for courtbook components.
//!
//! These traits define the contracts for:
//! - Booking storage (authoritative lifecycle state)
//! - Ledger recording (append-only money movement)
//! - Payment capture (external gateway)
//! - Status delivery (presence push channel)
//!
//! Each interface file carries its own error enum and `Result` alias.
//! Services depend on these traits as `Arc<dyn …>`, never on concrete
//! implementations.

pub mod booking_store;
pub mod ledger_recorder;
pub mod payment_gateway;
pub mod status_sink;

pub use booking_store::{BookingStore, StoreError, TransitionFields};
pub use ledger_recorder::{LedgerError, LedgerRecorder};
pub use payment_gateway::{CaptureError, CaptureReceipt, PaymentGateway};
pub use status_sink::{SinkError, StatusChange, StatusSink};
