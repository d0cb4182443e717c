use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError};

/// Signed money amount represented as integer **minor units**.
///
/// Use this type for **all** monetary values in the engine (split amounts,
/// totals, balances, transfers) to avoid floating-point drift. For `VND` a
/// minor unit is one dong; for `EUR`/`USD` it is a cent.
///
/// The value is signed:
/// - positive = the member is owed money
/// - negative = the member owes money
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::new(100_000);
/// assert_eq!(amount.minor(), 100_000);
/// assert_eq!(amount.format(Currency::Vnd), "100,000 VND");
/// assert_eq!(Money::new(-1234).format(Currency::Eur), "-12.34 EUR");
/// ```
///
/// Parsing integer minor units (`FromStr`) accepts digit groups of three
/// separated by `.`, `,`, `_` or spaces:
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("100000".parse::<Money>().unwrap().minor(), 100_000);
/// assert_eq!("100.000".parse::<Money>().unwrap().minor(), 100_000);
/// assert!("1,5".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
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

    #[must_use]
    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Addition clamped to the `i64` range.
    #[must_use]
    pub const fn saturating_add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Formats the amount in major units of `currency`, with `,` as thousands
    /// separator and the currency code as suffix.
    #[must_use]
    pub fn format(self, currency: Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = 10u64.pow(u32::from(currency.minor_units()));
        let major = group_thousands(abs / scale);
        match currency.minor_units() {
            0 => format!("{sign}{major} {}", currency.code()),
            digits => {
                let minor = abs % scale;
                format!(
                    "{sign}{major}.{minor:0width$} {}",
                    currency.code(),
                    width = usize::from(digits)
                )
            }
        }
    }

    /// Parses a human amount expressed in major units of `currency`.
    ///
    /// Accepts `.` or `,` as decimal separator when the currency has minor
    /// units, and an optional leading `+`/`-`. Rejects more fractional digits
    /// than the currency allows. For currencies without minor units (`VND`)
    /// this is the same as parsing integer minor units.
    pub fn parse_major(s: &str, currency: Currency) -> Result<Money, EngineError> {
        let digits = currency.minor_units();
        if digits == 0 {
            return s.parse();
        }

        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let (negative, rest) = split_sign(s)?;
        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let minor_str = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }
        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let major: i64 = major_str.parse().map_err(|_| overflow())?;

        let minor: i64 = match minor_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if frac.len() > usize::from(digits) {
                    return Err(EngineError::InvalidAmount("too many decimals".to_string()));
                }
                let padded = format!("{frac:0<width$}", width = usize::from(digits));
                padded.parse().map_err(|_| invalid())?
            }
        };

        let total = major
            .checked_mul(10i64.pow(u32::from(digits)))
            .and_then(|v| v.checked_add(minor))
            .ok_or_else(overflow)?;
        apply_sign(total, negative)
    }
}

fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (idx, ch) in raw.chars().enumerate() {
        if idx > 0 && (raw.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn split_sign(s: &str) -> Result<(bool, &str), EngineError> {
    let empty = || EngineError::InvalidAmount("empty amount".to_string());

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }
    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, trimmed)
    };
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(empty());
    }
    Ok((negative, rest))
}

fn apply_sign(value: i64, negative: bool) -> Result<Money, EngineError> {
    if negative {
        value
            .checked_neg()
            .map(Money)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
    } else {
        Ok(Money(value))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{}", group_thousands(self.0.unsigned_abs()))
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
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

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(self.0.saturating_neg())
    }
}

/// Saturates at the `i64` bounds. Use [`Money::checked_add`] where an
/// overflow has to be reported.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses an integer amount of minor units.
    ///
    /// Accepts an optional leading `+`/`-` and digit groups separated by `.`,
    /// `,`, `_` or a space, as long as every group after the first has exactly
    /// three digits (`100.000`, `1 250 000`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let (negative, rest) = split_sign(s)?;
        let groups: Vec<&str> = rest.split(['.', ',', '_', ' ']).collect();
        let (first, tail) = groups.split_first().ok_or_else(invalid)?;
        if first.is_empty() || first.len() > 3 && !tail.is_empty() {
            return Err(invalid());
        }
        if tail.iter().any(|group| group.len() != 3) {
            return Err(invalid());
        }

        let digits: String = groups.concat();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: i64 = digits.parse().map_err(|_| overflow())?;
        apply_sign(value, negative)
    }
}
