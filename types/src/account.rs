//! Account number type.
//!
//! Account numbers are assigned sequentially by the store, starting at
//! [`AccountNumber::FIRST`]. They are never reused: accounts cannot be
//! deleted, and allocation happens inside the same write transaction as the
//! insert, so a failed creation never consumes a number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique, sequentially assigned account identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountNumber(u64);

impl AccountNumber {
    /// The number given to the first account ever created.
    pub const FIRST: Self = Self(1001);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The number the store assigns to the account created after this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Big-endian key bytes, so numeric order equals lexicographic key order.
    pub fn to_key_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_key_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_then_next_is_sequential() {
        assert_eq!(AccountNumber::FIRST.as_u64(), 1001);
        assert_eq!(AccountNumber::FIRST.next(), AccountNumber::new(1002));
        assert_eq!(AccountNumber::FIRST.next().next(), AccountNumber::new(1003));
    }

    #[test]
    fn key_bytes_preserve_order() {
        let a = AccountNumber::new(1001);
        let b = AccountNumber::new(1002);
        assert!(a.to_key_bytes() < b.to_key_bytes());
        assert_eq!(AccountNumber::from_key_bytes(a.to_key_bytes()), a);
    }
}
