pub use allocation::{
    Percent, PercentShare, RawSplit, SplitStrategy, allocate, allocate_even, allocate_percentage,
    convert_raw_splits,
};
pub use balances::{BalanceSheet, compute_balances};
pub use commands::NewTransactionCmd;
pub use currency::{ConvertedSplits, Currency, ExchangeRate, convert_splits};
pub use drafts::{TransactionDraft, prepare_draft};
pub use error::EngineError;
pub use funds::Fund;
pub use members::{Member, MemberId, MemberRef, Roster};
pub use money::Money;
pub use ops::{Engine, EngineBuilder, FundBalances, MemberBalance, TransactionPage};
pub use parsing::{ParseError, ParseRequest, ParsedTransaction, QuickParser, TransactionParser};
pub use settlement::{Transfer, settle};
pub use splits::{Split, checked_splits_sum, splits_sum};
pub use transactions::{SplitKind, Transaction};
pub use validation::{
    Field, Severity, ValidationConfig, ValidationIssue, Validator, has_blocking,
};

mod allocation;
mod balances;
mod commands;
mod currency;
mod drafts;
mod error;
mod fund_members;
mod funds;
mod members;
mod money;
mod ops;
mod parsing;
mod settlement;
mod splits;
mod transactions;
mod util;
mod validation;

pub type ResultEngine<T> = Result<T, EngineError>;
