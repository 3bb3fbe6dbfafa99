//! Nullable store — thread-safe in-memory storage for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use teller_crypto::{PasswordDigest, PayloadCodec, PlainCodec, Sha256Digest};
use teller_store::{
    AccountRecord, AccountStore, Clock, StoreSummary, SystemClock, TransactionRecord,
};
use teller_types::{
    AccountNumber, Amount, Delta, TellerError, Timestamp, TransactionId, TransactionKind,
};

/// One logged change as held in memory. The description payload is kept in
/// its codec-encoded form, same as the durable backend.
struct StoredRecord {
    id: TransactionId,
    account: AccountNumber,
    kind: TransactionKind,
    amount: Amount,
    payload: Option<Vec<u8>>,
    timestamp: Timestamp,
}

/// All mutable state behind one lock, so every operation is atomic and two
/// operations racing on one account serialize.
struct MemoryState {
    accounts: HashMap<AccountNumber, AccountRecord>,
    usernames: HashMap<String, AccountNumber>,
    log: HashMap<AccountNumber, Vec<StoredRecord>>,
    next_account: AccountNumber,
    next_transaction: TransactionId,
}

impl MemoryState {
    fn append(
        &mut self,
        account: AccountNumber,
        kind: TransactionKind,
        amount: Amount,
        payload: Option<Vec<u8>>,
        timestamp: Timestamp,
    ) -> TransactionId {
        let id = self.next_transaction;
        self.log.entry(account).or_default().push(StoredRecord {
            id,
            account,
            kind,
            amount,
            payload,
            timestamp,
        });
        self.next_transaction = id.next();
        id
    }
}

/// An in-memory account store for testing.
///
/// Thread-safe: a single mutex serializes operations the way the durable
/// backend's single writer does. State is validated before anything is
/// mutated, so a failed operation leaves no partial state.
pub struct MemoryAccountStore {
    state: Mutex<MemoryState>,
    digest: Arc<dyn PasswordDigest>,
    codec: Arc<dyn PayloadCodec>,
    clock: Arc<dyn Clock>,
}

impl MemoryAccountStore {
    /// A store with the production collaborators (SHA-256 digest, plain
    /// codec, system clock).
    pub fn new() -> Self {
        Self::with_collaborators(
            Arc::new(Sha256Digest),
            Arc::new(PlainCodec),
            Arc::new(SystemClock),
        )
    }

    pub fn with_collaborators(
        digest: Arc<dyn PasswordDigest>,
        codec: Arc<dyn PayloadCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                accounts: HashMap::new(),
                usernames: HashMap::new(),
                log: HashMap::new(),
                next_account: AccountNumber::FIRST,
                next_transaction: TransactionId::FIRST,
            }),
            digest,
            codec,
            clock,
        }
    }

    fn encode_description(
        &self,
        description: Option<&str>,
    ) -> Result<Option<Vec<u8>>, TellerError> {
        description
            .map(|d| self.codec.encode(d))
            .transpose()
            .map_err(|e| TellerError::Unavailable(e.to_string()))
    }

    fn decode_record(&self, stored: &StoredRecord) -> Result<TransactionRecord, TellerError> {
        let description = stored
            .payload
            .as_deref()
            .map(|p| self.codec.decode(p))
            .transpose()
            .map_err(|e| TellerError::Unavailable(e.to_string()))?;
        Ok(TransactionRecord {
            id: stored.id,
            account: stored.account,
            kind: stored.kind,
            amount: stored.amount,
            description,
            timestamp: stored.timestamp,
        })
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for MemoryAccountStore {
    fn create_account(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
        initial_balance: Amount,
    ) -> Result<AccountNumber, TellerError> {
        let password_hash = self.digest.digest(password);
        let created_at = self.clock.now();

        let mut state = self.state.lock().unwrap();
        if state.usernames.contains_key(username) {
            return Err(TellerError::DuplicateUsername(username.to_string()));
        }
        let number = state.next_account;
        state.usernames.insert(username.to_string(), number);
        state.accounts.insert(
            number,
            AccountRecord {
                number,
                username: username.to_string(),
                password_hash,
                full_name: full_name.to_string(),
                balance: initial_balance,
                created_at,
            },
        );
        state.next_account = number.next();
        Ok(number)
    }

    fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountNumber, TellerError> {
        let state = self.state.lock().unwrap();
        let record = state
            .usernames
            .get(username)
            .and_then(|number| state.accounts.get(number))
            .ok_or(TellerError::InvalidCredentials)?;
        if self.digest.matches(password, &record.password_hash) {
            Ok(record.number)
        } else {
            Err(TellerError::InvalidCredentials)
        }
    }

    fn get_account(&self, number: AccountNumber) -> Result<Option<AccountRecord>, TellerError> {
        Ok(self.state.lock().unwrap().accounts.get(&number).cloned())
    }

    fn mutate_balance(
        &self,
        number: AccountNumber,
        delta: Delta,
        kind: TransactionKind,
        description: Option<&str>,
    ) -> Result<Amount, TellerError> {
        if delta.amount().is_zero() {
            return Err(TellerError::InvalidAmount("amount must be positive".to_string()));
        }
        let payload = self.encode_description(description)?;
        let timestamp = self.clock.now();

        let mut state = self.state.lock().unwrap();
        let record = state
            .accounts
            .get_mut(&number)
            .ok_or(TellerError::AccountNotFound(number))?;
        let balance = record.balance;
        let new_balance = match balance.checked_apply(delta) {
            Some(new_balance) => new_balance,
            None => {
                return Err(match delta {
                    Delta::Debit(requested) => {
                        TellerError::InsufficientFunds { balance, requested }
                    }
                    Delta::Credit(_) => {
                        TellerError::InvalidAmount("balance overflow".to_string())
                    }
                })
            }
        };
        record.balance = new_balance;
        state.append(number, kind, delta.amount(), payload, timestamp);
        Ok(new_balance)
    }

    fn transfer_balances(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: Amount,
    ) -> Result<(), TellerError> {
        if amount.is_zero() {
            return Err(TellerError::InvalidAmount("amount must be positive".to_string()));
        }
        if from == to {
            return Err(TellerError::InvalidAmount(
                "source and destination are the same account".to_string(),
            ));
        }
        let out_payload = self.encode_description(Some(&format!("Transfer to {}", to)))?;
        let in_payload = self.encode_description(Some(&format!("Transfer from {}", from)))?;
        let timestamp = self.clock.now();

        let mut state = self.state.lock().unwrap();
        let from_balance = state
            .accounts
            .get(&from)
            .map(|r| r.balance)
            .ok_or(TellerError::AccountNotFound(from))?;
        let to_balance = state
            .accounts
            .get(&to)
            .map(|r| r.balance)
            .ok_or(TellerError::AccountNotFound(to))?;
        let new_from = from_balance
            .checked_sub(amount)
            .ok_or(TellerError::InsufficientFunds {
                balance: from_balance,
                requested: amount,
            })?;
        let new_to = to_balance
            .checked_add(amount)
            .ok_or_else(|| TellerError::InvalidAmount("balance overflow".to_string()))?;

        // Checks done; from here on every effect commits.
        if let Some(record) = state.accounts.get_mut(&from) {
            record.balance = new_from;
        }
        if let Some(record) = state.accounts.get_mut(&to) {
            record.balance = new_to;
        }
        state.append(from, TransactionKind::TransferOut, amount, out_payload, timestamp);
        state.append(to, TransactionKind::TransferIn, amount, in_payload, timestamp);
        Ok(())
    }

    fn transaction_history(
        &self,
        number: AccountNumber,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, TellerError> {
        let state = self.state.lock().unwrap();
        match state.log.get(&number) {
            Some(records) => records
                .iter()
                .rev()
                .take(limit)
                .map(|r| self.decode_record(r))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn summary(&self) -> Result<StoreSummary, TellerError> {
        let state = self.state.lock().unwrap();
        Ok(StoreSummary {
            accounts: state.accounts.len() as u64,
            transactions: state.log.values().map(|v| v.len() as u64).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::NullClock;

    fn store_at(secs: u64) -> (MemoryAccountStore, Arc<NullClock>) {
        let clock = Arc::new(NullClock::new(secs));
        let store = MemoryAccountStore::with_collaborators(
            Arc::new(Sha256Digest),
            Arc::new(PlainCodec),
            clock.clone(),
        );
        (store, clock)
    }

    #[test]
    fn create_then_verify() {
        let (store, _) = store_at(1000);
        let number = store
            .create_account("alice", "hunter2", "Alice Jones", Amount::new(5000))
            .unwrap();
        assert_eq!(number, AccountNumber::new(1001));
        assert_eq!(store.verify_credentials("alice", "hunter2").unwrap(), number);

        let record = store.get_account(number).unwrap().unwrap();
        assert_eq!(record.username, "alice");
        assert_eq!(record.balance, Amount::new(5000));
        assert_eq!(record.created_at, Timestamp::new(1000));
        assert_ne!(record.password_hash, "hunter2");
    }

    #[test]
    fn wrong_password_and_unknown_user_look_identical() {
        let (store, _) = store_at(0);
        store
            .create_account("alice", "hunter2", "Alice", Amount::ZERO)
            .unwrap();
        let wrong = store.verify_credentials("alice", "hunter3").unwrap_err();
        let unknown = store.verify_credentials("bob", "hunter2").unwrap_err();
        assert!(matches!(wrong, TellerError::InvalidCredentials));
        assert!(matches!(unknown, TellerError::InvalidCredentials));
    }

    #[test]
    fn duplicate_username_does_not_consume_a_number() {
        let (store, _) = store_at(0);
        let first = store
            .create_account("alice", "pw", "Alice", Amount::ZERO)
            .unwrap();
        let err = store
            .create_account("alice", "other", "Alice Again", Amount::ZERO)
            .unwrap_err();
        assert!(matches!(err, TellerError::DuplicateUsername(ref u) if u == "alice"));

        let second = store
            .create_account("bob", "pw", "Bob", Amount::ZERO)
            .unwrap();
        assert_eq!(first, AccountNumber::new(1001));
        assert_eq!(second, AccountNumber::new(1002));
    }

    #[test]
    fn mutate_applies_delta_and_logs() {
        let (store, _) = store_at(50);
        let number = store
            .create_account("alice", "pw", "Alice", Amount::new(5000))
            .unwrap();

        let balance = store
            .mutate_balance(
                number,
                Delta::Credit(Amount::new(1500)),
                TransactionKind::Deposit,
                Some("Deposit"),
            )
            .unwrap();
        assert_eq!(balance, Amount::new(6500));

        let balance = store
            .mutate_balance(
                number,
                Delta::Debit(Amount::new(2000)),
                TransactionKind::Withdrawal,
                Some("Withdrawal"),
            )
            .unwrap();
        assert_eq!(balance, Amount::new(4500));

        let history = store.transaction_history(number, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, TransactionKind::Withdrawal);
        assert_eq!(history[0].amount, Amount::new(2000));
        assert_eq!(history[1].kind, TransactionKind::Deposit);
        assert_eq!(history[1].description.as_deref(), Some("Deposit"));
    }

    #[test]
    fn overdraw_fails_and_writes_nothing() {
        let (store, _) = store_at(0);
        let number = store
            .create_account("alice", "pw", "Alice", Amount::new(4500))
            .unwrap();
        let err = store
            .mutate_balance(
                number,
                Delta::Debit(Amount::new(10_000)),
                TransactionKind::Withdrawal,
                None,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TellerError::InsufficientFunds { balance, requested }
                if balance == Amount::new(4500) && requested == Amount::new(10_000)
        ));
        let record = store.get_account(number).unwrap().unwrap();
        assert_eq!(record.balance, Amount::new(4500));
        assert!(store.transaction_history(number, 10).unwrap().is_empty());
    }

    #[test]
    fn zero_delta_is_rejected() {
        let (store, _) = store_at(0);
        let number = store
            .create_account("alice", "pw", "Alice", Amount::new(100))
            .unwrap();
        let err = store
            .mutate_balance(
                number,
                Delta::Credit(Amount::ZERO),
                TransactionKind::Deposit,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, TellerError::InvalidAmount(_)));
    }

    #[test]
    fn mutate_unknown_account_not_found() {
        let (store, _) = store_at(0);
        let err = store
            .mutate_balance(
                AccountNumber::new(9999),
                Delta::Credit(Amount::new(1)),
                TransactionKind::Deposit,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, TellerError::AccountNotFound(n) if n == AccountNumber::new(9999)));
    }

    #[test]
    fn transfer_moves_money_and_pairs_records() {
        let (store, _) = store_at(0);
        let alice = store
            .create_account("alice", "pw", "Alice", Amount::new(4500))
            .unwrap();
        let bob = store
            .create_account("bob", "pw", "Bob", Amount::new(1000))
            .unwrap();

        store.transfer_balances(alice, bob, Amount::new(4500)).unwrap();

        assert_eq!(
            store.get_account(alice).unwrap().unwrap().balance,
            Amount::ZERO
        );
        assert_eq!(
            store.get_account(bob).unwrap().unwrap().balance,
            Amount::new(5500)
        );

        let out = &store.transaction_history(alice, 1).unwrap()[0];
        let inn = &store.transaction_history(bob, 1).unwrap()[0];
        assert_eq!(out.kind, TransactionKind::TransferOut);
        assert_eq!(inn.kind, TransactionKind::TransferIn);
        assert_eq!(out.amount, inn.amount);
        assert!(out.id < inn.id);
        assert_eq!(out.description.as_deref(), Some("Transfer to 1002"));
        assert_eq!(inn.description.as_deref(), Some("Transfer from 1001"));
    }

    #[test]
    fn failed_transfer_changes_nothing() {
        let (store, _) = store_at(0);
        let alice = store
            .create_account("alice", "pw", "Alice", Amount::new(100))
            .unwrap();
        let bob = store
            .create_account("bob", "pw", "Bob", Amount::new(1000))
            .unwrap();

        let err = store
            .transfer_balances(alice, bob, Amount::new(101))
            .unwrap_err();
        assert!(matches!(err, TellerError::InsufficientFunds { .. }));
        assert_eq!(
            store.get_account(alice).unwrap().unwrap().balance,
            Amount::new(100)
        );
        assert_eq!(
            store.get_account(bob).unwrap().unwrap().balance,
            Amount::new(1000)
        );
        assert!(store.transaction_history(alice, 10).unwrap().is_empty());
        assert!(store.transaction_history(bob, 10).unwrap().is_empty());
    }

    #[test]
    fn self_transfer_rejected() {
        let (store, _) = store_at(0);
        let alice = store
            .create_account("alice", "pw", "Alice", Amount::new(100))
            .unwrap();
        let err = store
            .transfer_balances(alice, alice, Amount::new(50))
            .unwrap_err();
        assert!(matches!(err, TellerError::InvalidAmount(_)));
        assert_eq!(
            store.get_account(alice).unwrap().unwrap().balance,
            Amount::new(100)
        );
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let (store, clock) = store_at(10);
        let number = store
            .create_account("alice", "pw", "Alice", Amount::ZERO)
            .unwrap();
        for i in 1..=5u128 {
            clock.advance(10);
            store
                .mutate_balance(
                    number,
                    Delta::Credit(Amount::new(i)),
                    TransactionKind::Deposit,
                    None,
                )
                .unwrap();
        }

        let history = store.transaction_history(number, 3).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].amount, Amount::new(5));
        assert_eq!(history[1].amount, Amount::new(4));
        assert_eq!(history[2].amount, Amount::new(3));
        assert!(history[0].id > history[1].id);
        assert!(history[0].timestamp > history[2].timestamp);
    }

    #[test]
    fn history_of_unknown_account_is_empty() {
        let (store, _) = store_at(0);
        assert!(store
            .transaction_history(AccountNumber::new(4242), 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn summary_counts_accounts_and_records() {
        let (store, _) = store_at(0);
        let alice = store
            .create_account("alice", "pw", "Alice", Amount::new(500))
            .unwrap();
        let bob = store
            .create_account("bob", "pw", "Bob", Amount::ZERO)
            .unwrap();
        store
            .mutate_balance(
                alice,
                Delta::Debit(Amount::new(100)),
                TransactionKind::Withdrawal,
                None,
            )
            .unwrap();
        store.transfer_balances(alice, bob, Amount::new(50)).unwrap();

        let summary = store.summary().unwrap();
        assert_eq!(summary.accounts, 2);
        assert_eq!(summary.transactions, 3);
    }
}
