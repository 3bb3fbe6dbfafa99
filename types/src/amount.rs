//! Monetary amounts and signed balance deltas.
//!
//! Amounts are represented as fixed-point integers (u128) to avoid
//! floating-point errors. The smallest unit is 1 minor unit; one major unit
//! is 100 minor units. All balance arithmetic is checked: a debit larger
//! than the balance surfaces as `None` from [`Amount::checked_sub`] rather
//! than wrapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minor units per major unit.
pub const MINOR_PER_MAJOR: u128 = 100;

/// A non-negative monetary value.
///
/// Internally stored as minor units (u128) for precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(minor: u128) -> Self {
        Self(minor)
    }

    /// An amount of whole major units, saturating at the top of the range.
    pub fn from_major(major: u128) -> Self {
        Self(major.saturating_mul(MINOR_PER_MAJOR))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Applies a signed delta, returning `None` on overflow or underflow.
    pub fn checked_apply(self, delta: Delta) -> Option<Self> {
        match delta {
            Delta::Credit(amount) => self.checked_add(amount),
            Delta::Debit(amount) => self.checked_sub(amount),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / MINOR_PER_MAJOR,
            self.0 % MINOR_PER_MAJOR
        )
    }
}

/// A signed change to a balance.
///
/// Stores apply deltas with [`Amount::checked_apply`]; a `Debit` that
/// exceeds the current balance fails instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delta {
    Credit(Amount),
    Debit(Amount),
}

impl Delta {
    /// The magnitude of the change, regardless of direction.
    pub fn amount(&self) -> Amount {
        match self {
            Delta::Credit(amount) | Delta::Debit(amount) => *amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_sub_refuses_underflow() {
        let balance = Amount::new(4500);
        assert_eq!(balance.checked_sub(Amount::new(10_000)), None);
        assert_eq!(
            balance.checked_sub(Amount::new(2000)),
            Some(Amount::new(2500))
        );
    }

    #[test]
    fn checked_apply_follows_delta_direction() {
        let balance = Amount::new(5000);
        assert_eq!(
            balance.checked_apply(Delta::Credit(Amount::new(1500))),
            Some(Amount::new(6500))
        );
        assert_eq!(
            balance.checked_apply(Delta::Debit(Amount::new(2000))),
            Some(Amount::new(3000))
        );
        assert_eq!(balance.checked_apply(Delta::Debit(Amount::new(5001))), None);
    }

    #[test]
    fn display_uses_two_minor_digits() {
        assert_eq!(Amount::new(4500).to_string(), "45.00");
        assert_eq!(Amount::new(7).to_string(), "0.07");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn from_major_scales() {
        assert_eq!(Amount::from_major(45), Amount::new(4500));
    }

    #[test]
    fn from_major_saturates_at_the_top() {
        assert_eq!(Amount::from_major(u128::MAX), Amount::new(u128::MAX));
        let largest_exact = u128::MAX / MINOR_PER_MAJOR;
        assert_eq!(
            Amount::from_major(largest_exact),
            Amount::new(largest_exact * MINOR_PER_MAJOR)
        );
    }
}
