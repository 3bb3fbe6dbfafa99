//! LMDB implementation of the account store.
//!
//! Every mutating operation runs inside a single LMDB write transaction:
//! balance check, balance write, record append, and id allocation commit
//! together or not at all. LMDB serializes writers, so two operations racing
//! on one account cannot both spend the same balance.
//!
//! Transaction records use the binary composite key
//! `account (u64 BE) ++ id (u64 BE)`, which makes a reverse range scan over
//! one account yield its history newest-first.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};
use serde::{Deserialize, Serialize};

use teller_crypto::{PasswordDigest, PayloadCodec};
use teller_store::{AccountRecord, AccountStore, Clock, StoreSummary, TransactionRecord};
use teller_types::{
    AccountNumber, Amount, Delta, TellerError, Timestamp, TransactionId, TransactionKind,
};

use crate::LmdbError;

const NEXT_ACCOUNT_KEY: &[u8] = b"next_account_number";
const NEXT_TRANSACTION_KEY: &[u8] = b"next_transaction_id";

const USERNAME_TAG: u8 = b'u';

/// A transaction record as persisted: the description is kept in its
/// codec-encoded form.
#[derive(Debug, Serialize, Deserialize)]
struct StoredTransaction {
    id: TransactionId,
    account: AccountNumber,
    kind: TransactionKind,
    amount: Amount,
    payload: Option<Vec<u8>>,
    timestamp: Timestamp,
}

/// Build the binary composite key `account (u64 BE) ++ id (u64 BE)`.
fn history_key(account: AccountNumber, id: TransactionId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&account.to_key_bytes());
    key[8..].copy_from_slice(&id.to_key_bytes());
    key
}

/// Key for the username index: a constant lead byte ahead of the username
/// bytes. LMDB rejects zero-length keys, and the empty username is legal.
fn username_key(username: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(username.len() + 1);
    key.push(USERNAME_TAG);
    key.extend_from_slice(username.as_bytes());
    key
}

pub struct LmdbAccountStore {
    env: Arc<Env>,
    accounts_db: Database<Bytes, Bytes>,
    usernames_db: Database<Bytes, Bytes>,
    transactions_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
    digest: Arc<dyn PasswordDigest>,
    codec: Arc<dyn PayloadCodec>,
    clock: Arc<dyn Clock>,
}

impl LmdbAccountStore {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        env: Arc<Env>,
        accounts_db: Database<Bytes, Bytes>,
        usernames_db: Database<Bytes, Bytes>,
        transactions_db: Database<Bytes, Bytes>,
        meta_db: Database<Bytes, Bytes>,
        digest: Arc<dyn PasswordDigest>,
        codec: Arc<dyn PayloadCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            env,
            accounts_db,
            usernames_db,
            transactions_db,
            meta_db,
            digest,
            codec,
            clock,
        }
    }

    // ── Raw reads ───────────────────────────────────────────────────────

    fn read_account(
        &self,
        txn: &RoTxn,
        number: AccountNumber,
    ) -> Result<Option<AccountRecord>, LmdbError> {
        let record = self
            .accounts_db
            .get(txn, &number.to_key_bytes())
            .map_err(LmdbError::from)?
            .map(bincode::deserialize::<AccountRecord>)
            .transpose()
            .map_err(LmdbError::from)?;
        Ok(record)
    }

    fn read_username(
        &self,
        txn: &RoTxn,
        username: &str,
    ) -> Result<Option<AccountNumber>, LmdbError> {
        let val = self
            .usernames_db
            .get(txn, &username_key(username))
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("invalid account number length".to_string())
                })?;
                Ok(Some(AccountNumber::from_key_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    fn next_account_number(&self, txn: &RoTxn) -> Result<AccountNumber, LmdbError> {
        let raw = self
            .meta_db
            .get(txn, NEXT_ACCOUNT_KEY)
            .map_err(LmdbError::from)?
            .and_then(|b| b.try_into().ok().map(u64::from_be_bytes))
            .unwrap_or(AccountNumber::FIRST.as_u64());
        Ok(AccountNumber::new(raw))
    }

    // ── Raw writes (callers hold the write transaction) ─────────────────

    fn write_account(&self, wtxn: &mut RwTxn, record: &AccountRecord) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        self.accounts_db
            .put(wtxn, &record.number.to_key_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn allocate_transaction_id(&self, wtxn: &mut RwTxn) -> Result<TransactionId, LmdbError> {
        let raw = self
            .meta_db
            .get(wtxn, NEXT_TRANSACTION_KEY)
            .map_err(LmdbError::from)?
            .and_then(|b| b.try_into().ok().map(u64::from_be_bytes))
            .unwrap_or(TransactionId::FIRST.as_u64());
        let id = TransactionId::new(raw);
        self.meta_db
            .put(wtxn, NEXT_TRANSACTION_KEY, &id.next().as_u64().to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(id)
    }

    fn append_transaction(
        &self,
        wtxn: &mut RwTxn,
        account: AccountNumber,
        kind: TransactionKind,
        amount: Amount,
        payload: Option<Vec<u8>>,
        timestamp: Timestamp,
    ) -> Result<TransactionId, LmdbError> {
        let id = self.allocate_transaction_id(wtxn)?;
        let stored = StoredTransaction {
            id,
            account,
            kind,
            amount,
            payload,
            timestamp,
        };
        let bytes = bincode::serialize(&stored).map_err(LmdbError::from)?;
        self.transactions_db
            .put(wtxn, &history_key(account, id), &bytes)
            .map_err(LmdbError::from)?;
        Ok(id)
    }

    // ── Codec plumbing ──────────────────────────────────────────────────

    fn encode_description(&self, description: Option<&str>) -> Result<Option<Vec<u8>>, LmdbError> {
        description
            .map(|d| self.codec.encode(d))
            .transpose()
            .map_err(|e| LmdbError::Serialization(e.to_string()))
    }

    fn into_record(&self, stored: StoredTransaction) -> Result<TransactionRecord, LmdbError> {
        let description = stored
            .payload
            .as_deref()
            .map(|p| self.codec.decode(p))
            .transpose()
            .map_err(|e| LmdbError::Serialization(e.to_string()))?;
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

impl AccountStore for LmdbAccountStore {
    fn create_account(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
        initial_balance: Amount,
    ) -> Result<AccountNumber, TellerError> {
        let password_hash = self.digest.digest(password);
        let created_at = self.clock.now();

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self.read_username(&wtxn, username)?.is_some() {
            return Err(TellerError::DuplicateUsername(username.to_string()));
        }
        let number = self.next_account_number(&wtxn)?;
        let record = AccountRecord {
            number,
            username: username.to_string(),
            password_hash,
            full_name: full_name.to_string(),
            balance: initial_balance,
            created_at,
        };
        self.write_account(&mut wtxn, &record)?;
        self.usernames_db
            .put(&mut wtxn, &username_key(username), &number.to_key_bytes())
            .map_err(LmdbError::from)?;
        self.meta_db
            .put(
                &mut wtxn,
                NEXT_ACCOUNT_KEY,
                &number.next().as_u64().to_be_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::info!(account = number.as_u64(), username, "account created");
        Ok(number)
    }

    fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountNumber, TellerError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let record = match self.read_username(&rtxn, username)? {
            Some(number) => self.read_account(&rtxn, number)?,
            None => None,
        };
        // Unknown username and wrong password take the same exit.
        match record {
            Some(record) if self.digest.matches(password, &record.password_hash) => {
                Ok(record.number)
            }
            _ => Err(TellerError::InvalidCredentials),
        }
    }

    fn get_account(&self, number: AccountNumber) -> Result<Option<AccountRecord>, TellerError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_account(&rtxn, number)?)
    }

    fn mutate_balance(
        &self,
        number: AccountNumber,
        delta: Delta,
        kind: TransactionKind,
        description: Option<&str>,
    ) -> Result<Amount, TellerError> {
        if delta.amount().is_zero() {
            return Err(TellerError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }
        let payload = self.encode_description(description)?;
        let timestamp = self.clock.now();

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut record = self
            .read_account(&wtxn, number)?
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
        self.write_account(&mut wtxn, &record)?;
        let id =
            self.append_transaction(&mut wtxn, number, kind, delta.amount(), payload, timestamp)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(
            account = number.as_u64(),
            id = id.as_u64(),
            kind = %kind,
            amount = %delta.amount(),
            balance = %new_balance,
            "balance mutated"
        );
        Ok(new_balance)
    }

    fn transfer_balances(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: Amount,
    ) -> Result<(), TellerError> {
        if amount.is_zero() {
            return Err(TellerError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }
        if from == to {
            return Err(TellerError::InvalidAmount(
                "source and destination are the same account".to_string(),
            ));
        }
        let out_payload = self.encode_description(Some(&format!("Transfer to {}", to)))?;
        let in_payload = self.encode_description(Some(&format!("Transfer from {}", from)))?;
        let timestamp = self.clock.now();

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut source = self
            .read_account(&wtxn, from)?
            .ok_or(TellerError::AccountNotFound(from))?;
        let mut destination = self
            .read_account(&wtxn, to)?
            .ok_or(TellerError::AccountNotFound(to))?;
        let new_from = source
            .balance
            .checked_sub(amount)
            .ok_or(TellerError::InsufficientFunds {
                balance: source.balance,
                requested: amount,
            })?;
        let new_to = destination
            .balance
            .checked_add(amount)
            .ok_or_else(|| TellerError::InvalidAmount("balance overflow".to_string()))?;

        // Checks done; all four effects commit together below.
        source.balance = new_from;
        destination.balance = new_to;
        self.write_account(&mut wtxn, &source)?;
        self.write_account(&mut wtxn, &destination)?;
        self.append_transaction(
            &mut wtxn,
            from,
            TransactionKind::TransferOut,
            amount,
            out_payload,
            timestamp,
        )?;
        self.append_transaction(
            &mut wtxn,
            to,
            TransactionKind::TransferIn,
            amount,
            in_payload,
            timestamp,
        )?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(
            from = from.as_u64(),
            to = to.as_u64(),
            amount = %amount,
            "transfer committed"
        );
        Ok(())
    }

    fn transaction_history(
        &self,
        number: AccountNumber,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, TellerError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let low = history_key(number, TransactionId::new(0));
        let high = history_key(number, TransactionId::new(u64::MAX));
        let bounds = (Bound::Included(&low[..]), Bound::Included(&high[..]));
        let iter = self
            .transactions_db
            .rev_range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            if results.len() >= limit {
                break;
            }
            let (_key, val) = entry.map_err(LmdbError::from)?;
            let stored: StoredTransaction = bincode::deserialize(val).map_err(LmdbError::from)?;
            results.push(self.into_record(stored)?);
        }
        Ok(results)
    }

    fn summary(&self) -> Result<StoreSummary, TellerError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let accounts = self.accounts_db.len(&rtxn).map_err(LmdbError::from)?;
        let transactions = self.transactions_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(StoreSummary {
            accounts,
            transactions,
        })
    }
}
