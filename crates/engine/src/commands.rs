//! Command structs for engine operations.
//!
//! These types group the parameters of transaction submission, keeping call
//! sites readable and avoiding long argument lists.

use crate::{ExchangeRate, MemberId, ParsedTransaction, SplitStrategy};

/// Submit (or preview) a transaction in a fund.
///
/// `amount` is kept as typed by the user so that validation can report it
/// when it does not parse.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub fund_id: String,
    pub user_id: MemberId,
    pub description: String,
    pub amount: String,
    pub paid_by: Option<MemberId>,
    pub strategy: SplitStrategy,
    /// Amounts are expressed in `rate.from` and converted into the fund
    /// currency.
    pub exchange_rate: Option<ExchangeRate>,
    pub reasoning: Option<String>,
    pub idempotency_key: Option<String>,
}

impl NewTransactionCmd {
    /// The acting user is the payer unless [`paid_by`](Self::paid_by) says
    /// otherwise.
    #[must_use]
    pub fn new(
        fund_id: impl Into<String>,
        user_id: MemberId,
        description: impl Into<String>,
        amount: impl Into<String>,
        strategy: SplitStrategy,
    ) -> Self {
        Self {
            fund_id: fund_id.into(),
            paid_by: Some(user_id.clone()),
            user_id,
            description: description.into(),
            amount: amount.into(),
            strategy,
            exchange_rate: None,
            reasoning: None,
            idempotency_key: None,
        }
    }

    /// Builds an AI-derived submission from parser output. Missing fields stay
    /// empty.
    #[must_use]
    pub fn from_parsed(fund_id: impl Into<String>, user_id: MemberId, parsed: ParsedTransaction) -> Self {
        Self {
            fund_id: fund_id.into(),
            user_id,
            description: parsed.description,
            amount: parsed.total_amount.unwrap_or_default(),
            paid_by: parsed.payer,
            strategy: SplitStrategy::AiDerived {
                splits: parsed.splits,
            },
            exchange_rate: None,
            reasoning: parsed.reasoning,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn paid_by(mut self, paid_by: MemberId) -> Self {
        self.paid_by = Some(paid_by);
        self
    }

    #[must_use]
    pub fn exchange_rate(mut self, rate: ExchangeRate) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
