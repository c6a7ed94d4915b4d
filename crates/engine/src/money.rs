use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Non-negative money amount in major units (e.g. `12.5` for 12.50).
///
/// Budgets, fixed expenses, transaction amounts and piggy bank fills are all
/// `Money`. A value can only be built through [`Money::new`], parsing or
/// deserialization, all of which reject negative and non-finite input, so
/// every `Money` in the engine is `>= 0`.
///
/// Daily allowances are fractions of a month, so amounts keep full `f64`
/// precision internally and are rounded to two decimals only for display.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12.34).unwrap();
/// assert_eq!(amount.to_string(), "12.34");
/// assert!(Money::new(-1.0).is_err());
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more than 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().value(), 10.0);
/// assert_eq!("10,5".parse::<Money>().unwrap().value(), 10.5);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money(f64);

impl Money {
    pub const ZERO: Money = Money(0.0);

    /// Creates a new amount, rejecting negative and non-finite values.
    pub fn new(value: f64) -> ResultEngine<Self> {
        if !value.is_finite() {
            return Err(EngineError::InvalidAmount(
                "amount must be a finite number".to_string(),
            ));
        }
        if value < 0.0 {
            return Err(EngineError::InvalidAmount("amount must be >= 0".to_string()));
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// `max(0, self - rhs)`.
    #[must_use]
    pub fn saturating_sub(self, rhs: Money) -> Money {
        Money((self.0 - rhs.0).max(0.0))
    }

    /// Signed difference, which may be negative.
    #[must_use]
    pub fn diff(self, rhs: Money) -> f64 {
        self.0 - rhs.0
    }

    /// Splits the amount into `parts` equal shares.
    ///
    /// `parts == 0` yields zero rather than infinity.
    #[must_use]
    pub fn split(self, parts: u32) -> Money {
        if parts == 0 {
            return Money::ZERO;
        }
        Money(self.0 / f64::from(parts))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<f64> for Money {
    type Error = EngineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for f64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl From<u32> for Money {
    fn from(value: u32) -> Self {
        Money(f64::from(value))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects negative, empty and invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }
        if trimmed.starts_with('-') {
            return Err(EngineError::InvalidAmount("amount must be >= 0".to_string()));
        }

        let rest = trimmed.strip_prefix('+').unwrap_or(trimmed).trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let whole = parts.next().ok_or_else(invalid)?;
        let frac = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        if let Some(frac) = frac {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            if frac.len() > 2 {
                return Err(EngineError::InvalidAmount("too many decimals".to_string()));
            }
        }

        let value: f64 = rest.trim_end_matches('.').parse().map_err(|_| invalid())?;
        Money::new(value)
    }
}
