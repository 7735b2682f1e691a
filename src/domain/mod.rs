//! Domain types: bookings, fee splits, wallet transactions, presence,
//! QR payloads.

pub mod booking;
pub mod fees;
pub mod ledger;
pub mod presence;
pub mod qr;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use fees::{FeeBreakdown, FeeCalculator};
pub use ledger::{NewTransaction, TransactionType, WalletTransaction};
pub use presence::PresenceStatus;
pub use qr::CheckinPayload;
