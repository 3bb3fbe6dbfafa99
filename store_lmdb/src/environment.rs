//! LMDB environment setup.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use teller_crypto::{PasswordDigest, PayloadCodec, PlainCodec, Sha256Digest};
use teller_store::{Clock, SystemClock};

use crate::account::LmdbAccountStore;
use crate::config::StoreConfig;
use crate::migration::Migrator;
use crate::LmdbError;

const ACCOUNTS_DB: &str = "accounts";
const USERNAMES_DB: &str = "usernames";
const TRANSACTIONS_DB: &str = "transactions";
const META_DB: &str = "meta";

const MAX_DBS: u32 = 8;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Wraps the LMDB environment and all database handles.
///
/// - `accounts`: account number (u64 BE) → bincode [`teller_store::AccountRecord`]
/// - `usernames`: username bytes → account number (u64 BE)
/// - `transactions`: account number (u64 BE) ++ transaction id (u64 BE) →
///   bincode stored record
/// - `meta`: schema version and id counters
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) accounts_db: Database<Bytes, Bytes>,
    pub(crate) usernames_db: Database<Bytes, Bytes>,
    pub(crate) transactions_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and bring the
    /// schema up to date.
    pub fn open(path: &Path, map_size: usize, max_readers: u32) -> Result<Self, LmdbError> {
        fs::create_dir_all(path).map_err(|e| LmdbError::Config(e.to_string()))?;

        // Safety: this process opens each environment directory at most once,
        // and the map is never resized while the environment is open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .max_readers(max_readers)
                .open(path)
        }
        .map_err(LmdbError::from)?;

        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        let accounts_db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, Some(ACCOUNTS_DB))
            .map_err(LmdbError::from)?;
        let usernames_db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, Some(USERNAMES_DB))
            .map_err(LmdbError::from)?;
        let transactions_db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, Some(TRANSACTIONS_DB))
            .map_err(LmdbError::from)?;
        let meta_db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, Some(META_DB))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        let environment = Self {
            env: Arc::new(env),
            accounts_db,
            usernames_db,
            transactions_db,
            meta_db,
        };
        Migrator::run(&environment)?;

        tracing::info!(path = %path.display(), map_size, "LMDB environment open");
        Ok(environment)
    }

    /// Open using a [`StoreConfig`].
    pub fn open_with_config(config: &StoreConfig) -> Result<Self, LmdbError> {
        Self::open(&config.path, config.map_size, config.max_readers)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// An account store over this environment with the production
    /// collaborators (SHA-256 digest, plain codec, system clock).
    pub fn account_store(&self) -> LmdbAccountStore {
        self.account_store_with(
            Arc::new(Sha256Digest),
            Arc::new(PlainCodec),
            Arc::new(SystemClock),
        )
    }

    /// An account store with explicit collaborators.
    pub fn account_store_with(
        &self,
        digest: Arc<dyn PasswordDigest>,
        codec: Arc<dyn PayloadCodec>,
        clock: Arc<dyn Clock>,
    ) -> LmdbAccountStore {
        LmdbAccountStore::new(
            self.env.clone(),
            self.accounts_db,
            self.usernames_db,
            self.transactions_db,
            self.meta_db,
            digest,
            codec,
            clock,
        )
    }

    pub(crate) fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) if bytes.len() == 4 => {
                let arr: [u8; 4] = bytes.try_into().expect("checked length");
                Ok(u32::from_le_bytes(arr))
            }
            Some(_) => Err(LmdbError::Serialization(
                "schema_version has unexpected byte length".to_string(),
            )),
            None => Ok(0),
        }
    }

    pub(crate) fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let bytes = version.to_le_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
