//! LMDB storage backend for the teller ledger.
//!
//! Implements the storage traits from `teller-store` using the `heed` LMDB
//! bindings. All account data lives in four databases within a single
//! environment; every mutating operation runs in one write transaction, so
//! its effects commit together or not at all.

pub mod account;
pub mod config;
pub mod environment;
pub mod error;
pub mod migration;

pub use account::LmdbAccountStore;
pub use config::StoreConfig;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
