//! Fundamental types for the teller banking ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account numbers, monetary amounts, timestamps, transaction
//! identifiers and kinds, and the closed error taxonomy.

pub mod account;
pub mod amount;
pub mod error;
pub mod time;
pub mod transaction;

pub use account::AccountNumber;
pub use amount::{Amount, Delta};
pub use error::TellerError;
pub use time::Timestamp;
pub use transaction::{TransactionId, TransactionKind};
