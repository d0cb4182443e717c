//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an item is not found (or not visible to the
//!   acting member).
//! - [`Validation`] thrown when a transaction is submitted with at least one
//!   `error`-severity issue. It carries every issue, warnings included.
//! - [`Parse`] thrown when the transaction parser collaborator fails.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Validation`]: EngineError::Validation
//!  [`Parse`]: EngineError::Parse
use sea_orm::DbErr;
use thiserror::Error;

use crate::{parsing::ParseError, validation::ValidationIssue};

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Invalid member: {0}")]
    InvalidMember(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Transaction rejected: {} blocking issue(s)", blocking_count(.0))]
    Validation(Vec<ValidationIssue>),
    #[error("Parser failed: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

fn blocking_count(issues: &[ValidationIssue]) -> usize {
    issues.iter().filter(|issue| issue.is_blocking()).count()
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidSplit(a), Self::InvalidSplit(b)) => a == b,
            (Self::InvalidMember(a), Self::InvalidMember(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Parse(a), Self::Parse(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
