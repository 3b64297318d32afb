//! Native-currency amounts.
//!
//! Amounts are fixed-point integers (u128 wei, 18 decimals) to avoid
//! floating-point drift in stake arithmetic. Decimal strings such as `"0.1"`
//! are only a presentation format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::TypesError;

/// Number of decimals of the native currency.
pub const DECIMALS: u32 = 18;

const ONE_ETHER: u128 = 10u128.pow(DECIMALS);

/// An amount of native currency, stored in wei.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole native units (`from_ether(1)` == 10^18 wei).
    pub const fn from_ether(units: u128) -> Self {
        Self(units * ONE_ETHER)
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

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// `self / total * 100`, rounded half-up and clamped to `[0, 100]`.
    ///
    /// Returns 0 when `total` is zero.
    pub fn share_of(self, total: Wei) -> u8 {
        if total.is_zero() {
            return 0;
        }
        if self.0 >= total.0 {
            return 100;
        }
        let scaled = self
            .0
            .checked_mul(100)
            .and_then(|v| v.checked_add(total.0 / 2))
            .map(|v| v / total.0)
            .unwrap_or_else(|| self.0 / (total.0 / 100).max(1));
        scaled.min(100) as u8
    }
}

impl Add for Wei {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Wei {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl std::iter::Sum for Wei {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Wei::ZERO, Wei::saturating_add)
    }
}

/// Decimal rendering with trailing zeros trimmed: `0.1`, `1.25`, `3`.
impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / ONE_ETHER;
        let frac = self.0 % ONE_ETHER;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{:0width$}", frac, width = DECIMALS as usize);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Wei {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || TypesError::InvalidAmount(s.to_string());
        if s.is_empty() {
            return Err(invalid());
        }
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if frac.len() > DECIMALS as usize
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
            || (whole.is_empty() && frac.is_empty())
        {
            return Err(invalid());
        }
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_value: u128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = DECIMALS as usize);
            padded.parse().map_err(|_| invalid())?
        };
        whole
            .checked_mul(ONE_ETHER)
            .and_then(|w| w.checked_add(frac_value))
            .map(Self)
            .ok_or_else(invalid)
    }
}
