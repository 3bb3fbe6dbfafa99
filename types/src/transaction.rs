//! Transaction identifiers and kinds.
//!
//! Every committed balance change is logged under a globally unique,
//! monotonically increasing identifier. Identifiers are allocated inside
//! the same write transaction that commits the change, so the log order
//! matches the order in which changes took effect.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A globally unique, monotonically increasing transaction identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// The identifier given to the first transaction ever logged.
    pub const FIRST: Self = Self(1);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Big-endian key bytes, so numeric order equals lexicographic key order.
    pub fn to_key_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_key_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of a logged transaction.
///
/// A transfer is logged as a pair: `TransferOut` on the source account and
/// `TransferIn` on the destination, committed together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferIn,
    TransferOut,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::TransferIn => "TRANSFER_IN",
            TransactionKind::TransferOut => "TRANSFER_OUT",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
