//! Account storage trait.

use crate::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};
use teller_types::{AccountNumber, Amount, Delta, TellerError, Timestamp, TransactionKind};

/// Per-account information stored in the ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Store-assigned primary key; the first account is numbered 1001.
    pub number: AccountNumber,
    /// Globally unique, immutable login name.
    pub username: String,
    /// Digest of the plaintext password; the plaintext is never stored.
    pub password_hash: String,
    pub full_name: String,
    /// Non-negative after every committed operation.
    pub balance: Amount,
    pub created_at: Timestamp,
}

/// Aggregate counts across the whole store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub accounts: u64,
    pub transactions: u64,
}

/// Trait for account storage operations.
///
/// Each mutating operation is atomic: either every effect it describes is
/// committed, or none is. Backends must also guarantee that two operations
/// racing on one account serialize, so a debit can never be admitted against
/// a balance another operation has already spent.
pub trait AccountStore: Send + Sync {
    /// Create an account, digesting the password and assigning the next
    /// sequential number. Fails with [`TellerError::DuplicateUsername`]
    /// without consuming a number if the username is taken.
    fn create_account(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
        initial_balance: Amount,
    ) -> Result<AccountNumber, TellerError>;

    /// Check a username/password pair against stored credentials.
    ///
    /// Unknown username and wrong password are indistinguishable: both
    /// yield [`TellerError::InvalidCredentials`].
    fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountNumber, TellerError>;

    /// Fetch an account by number. A missing account is `Ok(None)`.
    fn get_account(&self, number: AccountNumber) -> Result<Option<AccountRecord>, TellerError>;

    fn exists(&self, number: AccountNumber) -> Result<bool, TellerError> {
        self.get_account(number).map(|record| record.is_some())
    }

    /// Apply a signed delta to one balance and append the matching record,
    /// atomically. Returns the new balance.
    ///
    /// A `Debit` that exceeds the balance fails with
    /// [`TellerError::InsufficientFunds`]; a zero-magnitude delta fails with
    /// [`TellerError::InvalidAmount`]. Neither failure writes anything.
    fn mutate_balance(
        &self,
        number: AccountNumber,
        delta: Delta,
        kind: TransactionKind,
        description: Option<&str>,
    ) -> Result<Amount, TellerError>;

    /// Move `amount` between two accounts: debit the source, credit the
    /// destination, and append a `TransferOut`/`TransferIn` record pair, all
    /// in one atomic unit. A failure leaves every balance and history
    /// untouched.
    fn transfer_balances(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: Amount,
    ) -> Result<(), TellerError>;

    /// Up to `limit` records for the account, newest first. An unknown
    /// account yields an empty vector.
    fn transaction_history(
        &self,
        number: AccountNumber,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, TellerError>;

    /// Aggregate account and transaction counts.
    fn summary(&self) -> Result<StoreSummary, TellerError>;
}
