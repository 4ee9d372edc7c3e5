use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as **integer cents**.
///
/// Every monetary value in the engine (balances, expense amounts, transfers)
/// is a `MoneyCents`, so no balance ever exists as a binary float. Decimal
/// strings are accepted only at the I/O boundary through [`FromStr`].
///
/// The value is signed. For ledger balances:
/// - positive = the group owes this member
/// - negative = this member owes the group
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!("12.34".parse::<MoneyCents>().unwrap(), amount);
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> MoneyCents {
        MoneyCents(self.0.abs())
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }
}

/// Per-member share of an expense: `total / members`, rounded **half-up**
/// (toward positive infinity) on the cent.
///
/// The member count times the share does not always equal the total; the
/// remainder is up to the caller to attribute. The split updater keeps it on
/// the payer's balance.
///
/// Errors with [`EngineError::InvalidMemberCount`] when `members == 0` and
/// with [`EngineError::InvalidAmount`] when the total is too large to split.
///
/// ```rust
/// use engine::money::share;
/// use engine::MoneyCents;
///
/// assert_eq!(share(MoneyCents::new(10000), 3).unwrap().cents(), 3333);
/// assert_eq!(share(MoneyCents::new(50), 4).unwrap().cents(), 13);
/// ```
pub fn share(total: MoneyCents, members: usize) -> Result<MoneyCents, EngineError> {
    if members == 0 {
        return Err(EngineError::InvalidMemberCount(
            "cannot split between zero members".to_string(),
        ));
    }
    let n = members as i64;
    // round(a / n) with ties toward +inf, computed as floor(a/n + 1/2).
    // The doubling can overflow for totals past i64::MAX / 2, so it is
    // checked and surfaces as an invalid amount.
    let cents = total
        .cents()
        .checked_mul(2)
        .and_then(|doubled| doubled.checked_add(n))
        .ok_or_else(|| EngineError::InvalidAmount("amount too large to split".to_string()))?
        .div_euclid(2 * n);
    Ok(MoneyCents(cents))
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 += rhs.0;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 - rhs.0)
    }
}

impl SubAssign for MoneyCents {
    fn sub_assign(&mut self, rhs: MoneyCents) {
        self.0 -= rhs.0;
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> Self::Output {
        MoneyCents(-self.0)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator, an optional leading `+`/`-`,
    /// and at most 2 fractional digits (rejects `12.345`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s:?}"));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let normalized = digits.replace(',', ".");
        let (units_str, frac_str) = match normalized.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (normalized.as_str(), ""),
        };

        if units_str.is_empty() || !units_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let cents: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
            2 => frac_str.parse::<i64>().map_err(|_| invalid())?,
            _ => {
                return Err(EngineError::InvalidAmount(
                    "too many decimals".to_string(),
                ));
            }
        };

        let units: i64 = units_str.parse().map_err(|_| invalid())?;
        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;

        if negative {
            total.checked_neg().map(MoneyCents).ok_or_else(overflow)
        } else {
            Ok(MoneyCents(total))
        }
    }
}
