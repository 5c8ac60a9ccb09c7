use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "INR";
/// Number of minor units in one major unit (paise per rupee, cents per dollar).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

//--------------------------------------        Money        ---------------------------------------------------------
/// An amount of money, stored as a whole number of minor units (2 decimal places).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

/// Saturates rather than overflowing. Use [`Money::checked_add`] where an overflow must be reported.
impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Money::saturating_add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented as an amount of money: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Self).map_err(|_| MoneyConversionError(format!("{value} is too large")))
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    /// Parses decimal strings such as `"250"`, `"250.5"` or `"-12.05"`. More than two decimal places is an error;
    /// amounts are never silently rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MoneyConversionError(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() || frac.len() > 2 {
            return Err(err());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let whole = whole.parse::<i64>().map_err(|_| err())?;
        let frac = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse::<i64>().map_err(|_| err())?,
        };
        let minor = whole.checked_mul(MINOR_UNITS_PER_MAJOR).and_then(|w| w.checked_add(frac)).ok_or_else(err)?;
        Ok(Self(if negative { -minor } else { minor }))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(major: i64) -> Self {
        Self(major * MINOR_UNITS_PER_MAJOR)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// `self * quantity`, or `None` on overflow.
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Self)
    }

    pub fn saturating_add(self, rhs: Money) -> Money {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_mul(self, quantity: i64) -> Money {
        Self(self.0.saturating_mul(quantity))
    }
}

//--------------------------------------    CommissionRate   ---------------------------------------------------------
/// A commission rate in basis points (1/100th of a percent). `1000` is 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRate(u32);

pub const BASIS_POINTS_PER_UNIT: u32 = 10_000;

impl Default for CommissionRate {
    fn default() -> Self {
        Self(1_000)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid commission rate: {0}")]
pub struct CommissionRateError(String);

impl CommissionRate {
    pub fn from_basis_points(bps: u32) -> Result<Self, CommissionRateError> {
        if bps > BASIS_POINTS_PER_UNIT {
            return Err(CommissionRateError(format!("{bps} basis points exceeds 100%")));
        }
        Ok(Self(bps))
    }

    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// The platform's share of `amount`, rounded half-up to the nearest minor unit.
    pub fn fee_on(&self, amount: Money) -> Money {
        let scaled = i128::from(amount.value()) * i128::from(self.0);
        let half = i128::from(BASIS_POINTS_PER_UNIT / 2);
        let denom = i128::from(BASIS_POINTS_PER_UNIT);
        let fee = if scaled >= 0 { (scaled + half) / denom } else { -((-scaled + half) / denom) };
        // |fee| <= |amount| so this always fits
        Money::from(i64::try_from(fee).unwrap_or(amount.value()))
    }
}

impl FromStr for CommissionRate {
    type Err = CommissionRateError;

    /// Parses a decimal fraction such as `"0.10"` (up to four decimal places).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CommissionRateError(s.to_string());
        let (whole, frac) = s.trim().split_once('.').unwrap_or((s.trim(), ""));
        if whole.is_empty() || frac.len() > 4 {
            return Err(err());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let whole = whole.parse::<u32>().map_err(|_| err())?;
        let padded = format!("{frac:0<4}");
        let frac = padded.parse::<u32>().map_err(|_| err())?;
        let bps = whole.checked_mul(BASIS_POINTS_PER_UNIT).and_then(|w| w.checked_add(frac)).ok_or_else(err)?;
        Self::from_basis_points(bps)
    }
}

impl Display for CommissionRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:04}", self.0 / BASIS_POINTS_PER_UNIT, self.0 % BASIS_POINTS_PER_UNIT)
    }
}
