//! Append-only wallet transaction log interface.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::ledger::{NewTransaction, WalletTransaction};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("transaction amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("no ledger entry for booking {booking}")]
    MissingEntry { booking: Uuid },
}

/// Interface for the money-movement log.
///
/// Strictly append-only: entries are created once and never mutated or
/// deleted. Balances are derived views over the log, never stored state
/// that could desync from it. Withdrawal entries are appended by an
/// external payout process through this same contract; the recorder never
/// initiates transfers.
///
/// Implementations:
/// - `InMemoryLedger`
#[async_trait]
pub trait LedgerRecorder: Send + Sync {
    /// Append a transaction. Amounts must be positive; the sign is
    /// implied by the transaction type.
    async fn record(&self, tx: NewTransaction) -> Result<WalletTransaction>;

    /// The earning entry recorded for a settled booking, if any.
    async fn find_by_booking(&self, booking: Uuid) -> Result<Option<WalletTransaction>>;

    /// All transactions for a wallet owner, in append order.
    async fn transactions_for(&self, owner: Uuid) -> Result<Vec<WalletTransaction>>;

    /// Derived running balance: earnings minus withdrawals plus refunds.
    async fn balance_of(&self, owner: Uuid) -> Result<Decimal>;
}
