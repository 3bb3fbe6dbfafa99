//! Ledger operations for the teller banking core.
//!
//! [`Ledger`] owns an explicitly injected [`teller_store::AccountStore`]
//! handle and exposes the full operation surface a presentation layer
//! consumes: account creation and login, deposit, withdraw, transfer,
//! history, and summary. The ledger is identical over the durable LMDB
//! backend and the in-memory test double.

pub mod ledger;

pub use ledger::Ledger;
