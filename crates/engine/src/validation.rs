//! Transaction validation.
//!
//! Every check runs; nothing short-circuits. The output is an ordered list of
//! [`ValidationIssue`]s and never an `Err`: the caller blocks submission when
//! [`has_blocking`] is true.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MemberId, Money, Roster, Split, checked_splits_sum};

/// Thresholds of the heuristic checks, injected per [`Engine`](crate::Engine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Descriptions shorter than this (in characters) get a warning.
    pub min_description_len: usize,
    /// Amounts below this get a "missing zero?" warning.
    pub small_amount: i64,
    /// Amounts above this get an "extra zero?" warning.
    pub large_amount: i64,
    /// Largest accepted `|sum(splits)|`.
    pub split_tolerance: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_description_len: 3,
            small_amount: 1_000,
            large_amount: 100_000_000,
            split_tolerance: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Description,
    Amount,
    PaidBy,
    Splits,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Amount => "amount",
            Self::PaidBy => "paid_by",
            Self::Splits => "splits",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: Field,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn error(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level} on {}: {}", self.field.as_str(), self.message)
    }
}

pub fn has_blocking(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_blocking)
}

#[derive(Clone, Debug, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Description, amount and splits checks, in that order.
    pub fn validate(&self, description: &str, amount: &str, splits: &[Split]) -> Vec<ValidationIssue> {
        let mut issues = self.check_description(description);
        issues.extend(self.check_amount(amount));
        issues.extend(self.check_splits(splits));
        if let Some(total) = parse_amount(amount).filter(|t| t.is_positive()) {
            issues.extend(self.check_split_bounds(total, splits));
        }
        issues
    }

    pub fn check_description(&self, description: &str) -> Vec<ValidationIssue> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return vec![ValidationIssue::error(
                Field::Description,
                "description is required",
            )];
        }
        if trimmed.chars().count() < self.config.min_description_len {
            return vec![ValidationIssue::warning(
                Field::Description,
                format!(
                    "description is shorter than {} characters",
                    self.config.min_description_len
                ),
            )];
        }
        Vec::new()
    }

    pub fn check_amount(&self, amount: &str) -> Vec<ValidationIssue> {
        self.check_money(parse_amount(amount))
    }

    /// Amount checks on an already parsed value; `None` means the input did
    /// not parse.
    pub fn check_money(&self, amount: Option<Money>) -> Vec<ValidationIssue> {
        let Some(amount) = amount else {
            return vec![ValidationIssue::error(
                Field::Amount,
                "amount must be a whole number",
            )];
        };
        if !amount.is_positive() {
            return vec![ValidationIssue::error(
                Field::Amount,
                "amount must be greater than 0",
            )];
        }
        if amount.minor() < self.config.small_amount {
            return vec![ValidationIssue::warning(
                Field::Amount,
                format!("amount {amount} looks small, is a zero missing?"),
            )];
        }
        if amount.minor() > self.config.large_amount {
            return vec![ValidationIssue::warning(
                Field::Amount,
                format!("amount {amount} looks large, is there an extra zero?"),
            )];
        }
        Vec::new()
    }

    pub fn check_splits(&self, splits: &[Split]) -> Vec<ValidationIssue> {
        if splits.is_empty() {
            return vec![ValidationIssue::error(
                Field::Splits,
                "at least one split is required",
            )];
        }

        let mut issues = Vec::new();
        if splits.iter().all(|s| s.amount.is_zero()) {
            issues.push(ValidationIssue::error(
                Field::Splits,
                "all split amounts are zero",
            ));
        }
        match checked_splits_sum(splits) {
            None => issues.push(ValidationIssue::error(
                Field::Splits,
                "split amounts overflow",
            )),
            Some(sum) if sum.minor().unsigned_abs() > self.config.split_tolerance.unsigned_abs() => {
                issues.push(ValidationIssue::error(
                    Field::Splits,
                    format!("splits must sum to 0, off by {sum}"),
                ));
            }
            Some(_) => {}
        }
        issues
    }

    /// No single split may move more than the transaction total.
    pub fn check_split_bounds(&self, total: Money, splits: &[Split]) -> Vec<ValidationIssue> {
        let limit = total.minor().unsigned_abs();
        splits
            .iter()
            .filter(|s| s.amount.minor().unsigned_abs() > limit)
            .map(|s| {
                ValidationIssue::error(
                    Field::Splits,
                    format!("split of {} exceeds the total {total}", s.member_id),
                )
            })
            .collect()
    }

    /// Payer and split members must belong to the fund.
    pub fn check_roster(
        &self,
        paid_by: Option<&MemberId>,
        splits: &[Split],
        roster: &Roster,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        match paid_by {
            None => issues.push(ValidationIssue::error(Field::PaidBy, "payer is required")),
            Some(payer) if !roster.contains(payer) => issues.push(ValidationIssue::error(
                Field::PaidBy,
                format!("payer {payer} is not a member of this fund"),
            )),
            Some(_) => {}
        }

        let mut unknown: Vec<&MemberId> = splits
            .iter()
            .map(|s| &s.member_id)
            .filter(|id| !roster.contains(id))
            .collect();
        unknown.sort();
        unknown.dedup();
        issues.extend(unknown.into_iter().map(|id| {
            ValidationIssue::error(
                Field::Splits,
                format!("{id} is not a member of this fund"),
            )
        }));
        issues
    }
}

/// Amount text as typed by the user: an integer, optionally grouped by
/// thousands separators.
pub fn parse_amount(amount: &str) -> Option<Money> {
    amount.parse::<Money>().ok()
}
