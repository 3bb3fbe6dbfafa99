//! Top-level error type shared across crates.

use crate::account::AccountNumber;
use crate::amount::Amount;
use thiserror::Error;

/// Common error type for the teller ledger.
///
/// Every fallible operation in the workspace reports one of these. The
/// first five variants are domain rejections; `Busy` and `Unavailable`
/// report the state of the backing store itself.
#[derive(Debug, Error)]
pub enum TellerError {
    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account not found: {0}")]
    AccountNotFound(AccountNumber),

    #[error("insufficient funds: requested {requested}, balance {balance}")]
    InsufficientFunds { balance: Amount, requested: Amount },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("store busy: {0}")]
    Busy(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl TellerError {
    /// Whether retrying the same operation later could succeed.
    ///
    /// Domain rejections are final; only transient store pressure is
    /// worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TellerError::Busy(_))
    }
}
