//! Submission pipeline.
//!
//! `allocate -> convert -> validate -> roster check`, with every issue
//! collected on the resulting [`TransactionDraft`]. Preview, parse and append
//! all go through [`prepare_draft`]; only append persists.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, MemberId, Money, NewTransactionCmd, ResultEngine, Roster, Split,
    SplitKind, SplitStrategy, Transaction,
    allocation::{allocate, convert_raw_splits},
    currency::convert_splits,
    util::{collapse_whitespace, normalize_optional_text},
    validation::{Field, ValidationIssue, Validator, has_blocking},
};

/// A transaction as it would be stored, plus everything validation found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub description: String,
    /// `None` when the amount did not parse.
    pub total_amount: Option<Money>,
    pub currency: Currency,
    pub paid_by: Option<MemberId>,
    pub split_kind: SplitKind,
    pub splits: Vec<Split>,
    pub reasoning: Option<String>,
    pub issues: Vec<ValidationIssue>,
}

impl TransactionDraft {
    /// No `error`-severity issue.
    pub fn is_acceptable(&self) -> bool {
        !has_blocking(&self.issues)
    }

    pub fn warnings(&self) -> Vec<ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| !issue.is_blocking())
            .cloned()
            .collect()
    }

    /// Turns an acceptable draft into a new transaction of `fund_id`.
    pub(crate) fn into_transaction(
        self,
        fund_id: &str,
        created_by: MemberId,
    ) -> ResultEngine<Transaction> {
        if !self.is_acceptable() {
            return Err(EngineError::Validation(self.issues));
        }
        let total_amount = self
            .total_amount
            .ok_or_else(|| EngineError::InvalidAmount("missing amount".to_string()))?;
        let paid_by = self
            .paid_by
            .ok_or_else(|| EngineError::InvalidMember("missing payer".to_string()))?;

        Ok(Transaction {
            id: Uuid::new_v4(),
            fund_id: fund_id.to_string(),
            description: self.description,
            total_amount,
            currency: self.currency,
            paid_by,
            split_kind: self.split_kind,
            splits: self.splits,
            created_by,
            created_at: Utc::now(),
            voided_at: None,
            voided_by: None,
        })
    }
}

enum Allocated {
    Splits(Vec<Split>),
    Failed(String),
    /// Amount or payer missing; those are already reported.
    Skipped,
}

/// Runs the whole pipeline for `cmd` against a fund's roster and currency.
/// Never fails: problems end up in [`TransactionDraft::issues`].
pub fn prepare_draft(
    cmd: &NewTransactionCmd,
    fund_currency: Currency,
    roster: &Roster,
    validator: &Validator,
) -> TransactionDraft {
    let description = collapse_whitespace(&cmd.description);
    let input_currency = cmd.exchange_rate.map_or(fund_currency, |rate| rate.from);
    let mut total = Money::parse_major(&cmd.amount, input_currency).ok();
    let paid_by = cmd.paid_by.clone();

    let mut allocated = match &cmd.strategy {
        SplitStrategy::Custom { splits } => Allocated::Splits(splits.clone()),
        SplitStrategy::AiDerived { splits } => Allocated::Splits(convert_raw_splits(splits)),
        strategy => match (total.filter(|t| t.is_positive()), paid_by.as_ref()) {
            (Some(total), Some(payer)) => match allocate(total, payer, strategy) {
                Ok(splits) => Allocated::Splits(splits),
                Err(EngineError::InvalidSplit(msg) | EngineError::InvalidAmount(msg)) => {
                    Allocated::Failed(msg)
                }
                Err(err) => Allocated::Failed(err.to_string()),
            },
            _ => Allocated::Skipped,
        },
    };

    // Bounds are checked against the amount as typed, before conversion.
    let bound_issues = match (&allocated, total) {
        (Allocated::Splits(splits), Some(total)) if total.is_positive() => {
            validator.check_split_bounds(total, splits)
        }
        _ => Vec::new(),
    };

    let mut conversion_issue = None;
    if let Some(rate) = &cmd.exchange_rate {
        if rate.to != fund_currency {
            conversion_issue = Some(ValidationIssue::error(
                Field::Amount,
                format!("exchange rate converts to {}, fund uses {fund_currency}", rate.to),
            ));
        } else if let Allocated::Splits(splits) = &allocated {
            match convert_splits(splits, total.unwrap_or_default(), rate.from, rate) {
                Ok(converted) => {
                    total = total.map(|_| converted.total_amount);
                    allocated = Allocated::Splits(converted.splits);
                }
                Err(err) => {
                    conversion_issue = Some(ValidationIssue::error(Field::Amount, err.to_string()));
                }
            }
        } else if let Some(amount) = total {
            total = rate.convert(amount).ok();
        }
    }

    let mut issues = validator.check_description(&description);
    issues.extend(validator.check_money(total));
    issues.extend(conversion_issue);
    let splits = match allocated {
        Allocated::Splits(splits) => {
            issues.extend(validator.check_splits(&splits));
            issues.extend(bound_issues);
            splits
        }
        Allocated::Failed(message) => {
            issues.push(ValidationIssue::error(Field::Splits, message));
            Vec::new()
        }
        Allocated::Skipped => Vec::new(),
    };
    issues.extend(validator.check_roster(paid_by.as_ref(), &splits, roster));

    TransactionDraft {
        description,
        total_amount: total,
        currency: fund_currency,
        paid_by,
        split_kind: cmd.strategy.kind(),
        splits,
        reasoning: normalize_optional_text(cmd.reasoning.as_deref()),
        issues,
    }
}
