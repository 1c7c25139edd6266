use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const VND_CURRENCY_CODE: &str = "VND";

//--------------------------------------        Vnd          ---------------------------------------------------------
/// An amount in Vietnamese dong. The dong has no minor unit, so every price, total and payment amount in the system is
/// a whole number of these.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Vnd(i64);

op!(binary Vnd, Add, add);
op!(binary Vnd, Sub, sub);
op!(inplace Vnd, AddAssign, add_assign);
op!(inplace Vnd, SubAssign, sub_assign);
op!(unary Vnd, Neg, neg);

impl Mul<i64> for Vnd {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Vnd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in VND: {0}")]
pub struct VndConversionError(String);

impl From<i64> for Vnd {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Vnd {
    type Error = VndConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(VndConversionError(format!("Value {value} is too large to convert to VND")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Vnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Thousands are grouped with '.' the way receipts print them
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{grouped}₫")
    }
}

impl Vnd {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The absolute difference between two amounts.
    pub fn abs_diff(&self, other: Vnd) -> Vnd {
        Self((self.0 - other.0).abs())
    }

    /// Returns `None` if the sum does not fit.
    pub fn checked_add(self, rhs: Vnd) -> Option<Vnd> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Returns `None` if the product does not fit.
    pub fn checked_mul(self, rhs: i64) -> Option<Vnd> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// Applies a percentage discount, rounding half up to the nearest dong. Returns `None` on overflow.
    pub fn discounted(&self, discount_percent: i64) -> Option<Vnd> {
        let scaled = self.0.checked_mul(100i64.checked_sub(discount_percent)?)?.checked_add(50)?;
        Some(Self(scaled.div_euclid(100)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_groups_thousands() {
        assert_eq!(Vnd::from(0).to_string(), "0₫");
        assert_eq!(Vnd::from(950).to_string(), "950₫");
        assert_eq!(Vnd::from(25_000).to_string(), "25.000₫");
        assert_eq!(Vnd::from(1_250_000).to_string(), "1.250.000₫");
        assert_eq!(Vnd::from(-3_000).to_string(), "-3.000₫");
    }

    #[test]
    fn discounts_round_half_up() {
        assert_eq!(Vnd::from(30_000).discounted(0), Some(Vnd::from(30_000)));
        assert_eq!(Vnd::from(30_000).discounted(10), Some(Vnd::from(27_000)));
        assert_eq!(Vnd::from(15).discounted(50), Some(Vnd::from(8)));
        assert_eq!(Vnd::from(45_000).discounted(100), Some(Vnd::from(0)));
    }

    #[test]
    fn checked_arithmetic_stops_at_overflow() {
        assert_eq!(Vnd::from(2_000).checked_mul(3), Some(Vnd::from(6_000)));
        assert_eq!(Vnd::from(i64::MAX / 2).checked_mul(3), None);
        assert_eq!(Vnd::from(i64::MAX).checked_add(Vnd::from(1)), None);
        assert_eq!(Vnd::from(1).checked_add(Vnd::from(2)), Some(Vnd::from(3)));
        // Fits as a price, but not once scaled by the discount
        assert_eq!(Vnd::from(i64::MAX / 10).discounted(0), None);
    }

    #[test]
    fn arithmetic() {
        let mut total = Vnd::from(10_000) + Vnd::from(5_000);
        total -= Vnd::from(1_000);
        assert_eq!(total, Vnd::from(14_000));
        assert_eq!(Vnd::from(2_000) * 3, Vnd::from(6_000));
        assert_eq!(Vnd::from(1_000).abs_diff(Vnd::from(1_800)), Vnd::from(800));
        let sum: Vnd = [1, 2, 3].into_iter().map(Vnd::from).sum();
        assert_eq!(sum, Vnd::from(6));
    }
}
