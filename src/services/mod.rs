//! Service implementations: settlement orchestration and the presence
//! scheduler.

pub mod presence_scheduler;
pub mod settlement;

pub use presence_scheduler::PresenceScheduler;
pub use settlement::{
    PaymentSummary, SettlementError, SettlementRequest, SettlementResponse, SettlementService,
    StateError, ValidationError,
};
