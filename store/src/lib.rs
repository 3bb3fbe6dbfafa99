//! Abstract storage traits for the teller ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the workspace depends only on the traits, so the
//! ledger operations are identical over a durable store and a test double.

pub mod account;
pub mod clock;
pub mod transaction;

pub use account::{AccountRecord, AccountStore, StoreSummary};
pub use clock::{Clock, SystemClock};
pub use transaction::TransactionRecord;
