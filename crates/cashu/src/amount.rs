//! Amount — value in the mint's smallest denomination unit
// Split-into-powers-of-two grounded in crates/cashu/src/amount.rs::Amount::split,
// reworked to a plain u64 newtype (Cashu amounts are unit-agnostic integers,
// not necessarily satoshis) and to ascending iteration order, since the pay
// engine must emit silent outputs in the same ascending order the scanner
// indexes candidates by (see cashu::silent).

use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A value denominated in the mint's smallest unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// The zero amount
    pub const ZERO: Amount = Amount(0);

    /// Split into denominations that are powers of two, ascending
    /// (smallest denomination first). Mirrors the standard Cashu split: each
    /// set bit of the amount becomes one output of that power-of-two value.
    pub fn split(&self) -> Vec<Self> {
        (0_u32..64)
            .filter_map(|bit| {
                let part = 1_u64 << bit;
                ((self.0 & part) == part).then_some(Self(part))
            })
            .collect()
    }

    /// Raw integer value
    pub fn to_u64(self) -> u64 {
        self.0
    }

    /// Checked subtraction, for balances that must not go negative
    pub fn checked_sub(self, rhs: Self) -> Result<Self, Error> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(Error::AmountOverflow)
    }

    /// Fallible sum, erroring on overflow rather than panicking
    pub fn try_sum<I: IntoIterator<Item = Amount>>(iter: I) -> Result<Self, Error> {
        let mut total: u64 = 0;
        for amount in iter {
            total = total.checked_add(amount.0).ok_or(Error::AmountOverflow)?;
        }
        Ok(Self(total))
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Amount> for u64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_ascending_powers_of_two() {
        let parts = Amount::from(13).split(); // 13 = 0b1101
        assert_eq!(
            parts.into_iter().map(Amount::to_u64).collect::<Vec<_>>(),
            vec![1, 4, 8]
        );
    }

    #[test]
    fn split_zero_is_empty() {
        assert!(Amount::ZERO.split().is_empty());
    }

    #[test]
    fn try_sum_overflows_cleanly() {
        let res = Amount::try_sum([Amount::from(u64::MAX), Amount::from(1)]);
        assert!(matches!(res, Err(Error::AmountOverflow)));
    }
}
