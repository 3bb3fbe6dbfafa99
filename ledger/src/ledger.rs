//! The ledger operations component.

use teller_store::{AccountRecord, AccountStore, StoreSummary, TransactionRecord};
use teller_types::{AccountNumber, Amount, Delta, TellerError, TransactionKind};

/// Coordinates the money-movement operations over an injected store.
///
/// The ledger validates requests before they reach the store (zero amounts
/// and self-transfers are rejected up front), delegates the atomic work to
/// the store primitives, and adds structured logging. It holds no state of
/// its own, so it is as thread-safe as the store behind it.
pub struct Ledger<S: AccountStore> {
    store: S,
}

impl<S: AccountStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open an account with an initial balance. The plaintext password never
    /// gets past the store's digest.
    pub fn create_account(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
        initial_balance: Amount,
    ) -> Result<AccountNumber, TellerError> {
        let number = self
            .store
            .create_account(username, password, full_name, initial_balance)?;
        tracing::info!(account = number.as_u64(), username, "account opened");
        Ok(number)
    }

    /// Check a login. Unknown username and wrong password both come back as
    /// [`TellerError::InvalidCredentials`].
    pub fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountNumber, TellerError> {
        self.store.verify_credentials(username, password)
    }

    pub fn get_account(&self, number: AccountNumber) -> Result<Option<AccountRecord>, TellerError> {
        self.store.get_account(number)
    }

    /// Credit an account. Returns the new balance.
    pub fn deposit(
        &self,
        number: AccountNumber,
        amount: Amount,
        description: Option<&str>,
    ) -> Result<Amount, TellerError> {
        require_positive(amount)?;
        let balance = self.store.mutate_balance(
            number,
            Delta::Credit(amount),
            TransactionKind::Deposit,
            Some(description.unwrap_or("Deposit")),
        )?;
        tracing::info!(
            account = number.as_u64(),
            amount = %amount,
            balance = %balance,
            "deposit"
        );
        Ok(balance)
    }

    /// Debit an account. Returns the new balance.
    ///
    /// The covering-balance check happens inside the store's write
    /// transaction, so two concurrent withdrawals cannot both succeed
    /// against one covering balance.
    pub fn withdraw(
        &self,
        number: AccountNumber,
        amount: Amount,
        description: Option<&str>,
    ) -> Result<Amount, TellerError> {
        require_positive(amount)?;
        let balance = self.store.mutate_balance(
            number,
            Delta::Debit(amount),
            TransactionKind::Withdrawal,
            Some(description.unwrap_or("Withdrawal")),
        )?;
        tracing::info!(
            account = number.as_u64(),
            amount = %amount,
            balance = %balance,
            "withdrawal"
        );
        Ok(balance)
    }

    /// Move money between two accounts as one atomic unit: the source is
    /// debited, the destination credited, and a `TransferOut`/`TransferIn`
    /// record pair is appended. A failure leaves both accounts untouched.
    pub fn transfer(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: Amount,
    ) -> Result<(), TellerError> {
        require_positive(amount)?;
        if from == to {
            return Err(TellerError::InvalidAmount(
                "source and destination are the same account".to_string(),
            ));
        }
        self.store.transfer_balances(from, to, amount)?;
        tracing::info!(
            from = from.as_u64(),
            to = to.as_u64(),
            amount = %amount,
            "transfer"
        );
        Ok(())
    }

    /// Up to `limit` records for the account, newest first.
    pub fn transaction_history(
        &self,
        number: AccountNumber,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, TellerError> {
        self.store.transaction_history(number, limit)
    }

    pub fn summary(&self) -> Result<StoreSummary, TellerError> {
        self.store.summary()
    }
}

fn require_positive(amount: Amount) -> Result<(), TellerError> {
    if amount.is_zero() {
        return Err(TellerError::InvalidAmount(
            "amount must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teller_nullables::MemoryAccountStore;

    fn ledger() -> Ledger<MemoryAccountStore> {
        Ledger::new(MemoryAccountStore::new())
    }

    #[test]
    fn zero_amounts_never_reach_the_store() {
        let ledger = ledger();
        // An unknown account would produce AccountNotFound if the store were
        // consulted; InvalidAmount proves the request died at the ledger.
        let err = ledger
            .deposit(AccountNumber::new(9999), Amount::ZERO, None)
            .unwrap_err();
        assert!(matches!(err, TellerError::InvalidAmount(_)));

        let err = ledger
            .withdraw(AccountNumber::new(9999), Amount::ZERO, None)
            .unwrap_err();
        assert!(matches!(err, TellerError::InvalidAmount(_)));

        let err = ledger
            .transfer(AccountNumber::new(9999), AccountNumber::new(9998), Amount::ZERO)
            .unwrap_err();
        assert!(matches!(err, TellerError::InvalidAmount(_)));
    }

    #[test]
    fn self_transfer_never_reaches_the_store() {
        let ledger = ledger();
        let err = ledger
            .transfer(AccountNumber::new(9999), AccountNumber::new(9999), Amount::new(10))
            .unwrap_err();
        assert!(matches!(err, TellerError::InvalidAmount(_)));
    }

    #[test]
    fn deposit_and_withdraw_use_default_descriptions() {
        let ledger = ledger();
        let number = ledger
            .create_account("alice", "pw", "Alice", Amount::new(1000))
            .unwrap();

        ledger.deposit(number, Amount::new(100), None).unwrap();
        ledger.withdraw(number, Amount::new(50), None).unwrap();
        ledger
            .deposit(number, Amount::new(25), Some("Birthday money"))
            .unwrap();

        let history = ledger.transaction_history(number, 10).unwrap();
        assert_eq!(history[0].description.as_deref(), Some("Birthday money"));
        assert_eq!(history[1].description.as_deref(), Some("Withdrawal"));
        assert_eq!(history[2].description.as_deref(), Some("Deposit"));
    }

    #[test]
    fn login_round_trip() {
        let ledger = ledger();
        let number = ledger
            .create_account("alice", "hunter2", "Alice", Amount::ZERO)
            .unwrap();
        assert_eq!(ledger.verify_credentials("alice", "hunter2").unwrap(), number);
        assert!(matches!(
            ledger.verify_credentials("alice", "wrong"),
            Err(TellerError::InvalidCredentials)
        ));
    }
}
