//! Transaction record type.

use serde::{Deserialize, Serialize};
use teller_types::{AccountNumber, Amount, Timestamp, TransactionId, TransactionKind};

/// One committed balance change, as read back from a store.
///
/// Records are append-only: no update or delete path exists. A transfer
/// produces exactly two records with the same amount, one per side, created
/// in the same atomic unit; the `TransferOut` side carries the smaller id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Store-assigned, monotonically increasing, never reused.
    pub id: TransactionId,
    /// The account this record is logged on.
    pub account: AccountNumber,
    pub kind: TransactionKind,
    /// Strictly positive magnitude; direction is implied by `kind`.
    pub amount: Amount,
    pub description: Option<String>,
    pub timestamp: Timestamp,
}
