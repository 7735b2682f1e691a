//! Storage implementations.
//!
//! Durable backing is an external collaborator; the shipped
//! implementations keep authoritative state in process memory behind the
//! storage interfaces.

pub mod memory;

pub use memory::{InMemoryBookingStore, InMemoryLedger};
