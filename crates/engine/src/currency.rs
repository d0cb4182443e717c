use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine, Split, checked_splits_sum};

/// ISO currency code used by a fund and its money values.
///
/// ## Minor units
///
/// The engine stores monetary values as an `i64` number of **minor units**
/// (see `Money`). `minor_units()` returns how many decimal digits are used
/// when converting between:
/// - major units (human input/output, e.g. `10.50 EUR`)
/// - minor units (stored integers, e.g. `1050`)
///
/// `VND` has no subunits, so `100.000 VND` ⇄ `100000`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Vnd,
    Usd,
    Eur,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Vnd => "VND",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Vnd => 0,
            Currency::Usd | Currency::Eur => 2,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "VND" => Ok(Currency::Vnd),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(EngineError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

/// A conversion rate supplied by the currency-conversion collaborator.
///
/// `rate` is expressed in major units: one `from` unit is worth `rate` `to`
/// units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
}

impl ExchangeRate {
    pub fn new(from: Currency, to: Currency, rate: Decimal) -> ResultEngine<Self> {
        if rate <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(
                "exchange rate must be > 0".to_string(),
            ));
        }
        Ok(Self { from, to, rate })
    }

    /// Converts an amount of `from` minor units into `to` minor units,
    /// rounding half to even.
    pub fn convert(&self, amount: Money) -> ResultEngine<Money> {
        let overflow = || EngineError::InvalidAmount("converted amount too large".to_string());

        let from_scale = Decimal::from(10i64.pow(u32::from(self.from.minor_units())));
        let to_scale = Decimal::from(10i64.pow(u32::from(self.to.minor_units())));

        let major = Decimal::from(amount.minor()) / from_scale;
        let converted = major
            .checked_mul(self.rate)
            .and_then(|v| v.checked_mul(to_scale))
            .ok_or_else(overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        converted.to_i64().map(Money::new).ok_or_else(overflow)
    }
}

/// Result of re-expressing a transaction in another currency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertedSplits {
    pub currency: Currency,
    pub total_amount: Money,
    pub splits: Vec<Split>,
}

/// Recomputes `splits` (and the total) in the target currency of `rate`.
///
/// Each split is converted independently. When the source splits are
/// zero-sum, the rounding residual is charged to the largest creditor (first
/// one on ties) so the converted splits are zero-sum too. Splits that were
/// already unbalanced are converted as they are.
pub fn convert_splits(
    splits: &[Split],
    total_amount: Money,
    source: Currency,
    rate: &ExchangeRate,
) -> ResultEngine<ConvertedSplits> {
    if rate.from != source {
        return Err(EngineError::CurrencyMismatch(format!(
            "rate converts from {}, splits are in {}",
            rate.from, source
        )));
    }

    let mut converted = splits
        .iter()
        .map(|split| {
            Ok(Split {
                member_id: split.member_id.clone(),
                amount: rate.convert(split.amount)?,
            })
        })
        .collect::<ResultEngine<Vec<Split>>>()?;

    let source_sum = checked_splits_sum(splits);
    let residual = checked_splits_sum(&converted);
    if let (Some(source_sum), Some(residual)) = (source_sum, residual) {
        if source_sum.is_zero() && !residual.is_zero() {
            let creditor = converted
                .iter_mut()
                .filter(|s| s.amount.is_positive())
                .reduce(|best, s| if s.amount > best.amount { s } else { best });
            if let Some(creditor) = creditor {
                creditor.amount = creditor.amount.checked_sub(residual).unwrap_or(creditor.amount);
            }
        }
    }

    Ok(ConvertedSplits {
        currency: rate.to,
        total_amount: rate.convert(total_amount)?,
        splits: converted,
    })
}
