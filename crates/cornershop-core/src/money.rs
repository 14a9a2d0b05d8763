//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    999.99 × 2 + 1.99 × 3 = 2005.9499999999998  ❌ WRONG!                │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    99999 × 2 + 199 × 3 = 200595 cents = $2005.95                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cornershop_core::money::Money;
//!
//! let apple = Money::from_cents(199);
//! assert_eq!(apple.multiply_quantity(3).to_string(), "$5.97");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// An amount in cents. Prices, line subtotals and sale totals all use it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Line subtotal: unit price times quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// `$12.34`, or `-$12.34` for negative amounts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(99_999).to_string(), "$999.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::from_cents(7).to_string(), "$0.07");
        assert_eq!(Money::default().to_string(), "$0.00");
    }

    #[test]
    fn test_sum_of_line_totals() {
        let total: Money = [
            Money::from_cents(99_999).multiply_quantity(2),
            Money::from_cents(199).multiply_quantity(3),
        ]
        .into_iter()
        .sum();

        assert_eq!(total.cents(), 200_595);
        assert_eq!(total.to_string(), "$2005.95");
        assert_eq!(Vec::<Money>::new().into_iter().sum::<Money>(), Money::zero());
    }
}
