//! Wallet transaction records: immutable entries in the money-movement log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of money movement. Amounts are stored positive; the sign a
/// transaction contributes to a balance is implied by its type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    Earning,
    Withdrawal,
    Refund,
}

impl TransactionType {
    /// Sign the given positive amount contributes to a wallet balance.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Self::Earning | Self::Refund => amount,
            Self::Withdrawal => -amount,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Earning => write!(f, "earning"),
            Self::Withdrawal => write!(f, "withdrawal"),
            Self::Refund => write!(f, "refund"),
        }
    }
}

/// An immutable record of money movement. Created once, never mutated
/// or deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: Uuid,
    /// Wallet owner (the instructor, for earnings).
    pub owner_id: Uuid,
    pub tx_type: TransactionType,
    /// Always positive; sign implied by `tx_type`.
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_ref: Option<Uuid>,
}

/// Input shape for appending a transaction; id and date are assigned by
/// the recorder.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub owner_id: Uuid,
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub booking_ref: Option<Uuid>,
}
