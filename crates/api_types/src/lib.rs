use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Vnd,
    Usd,
    Eur,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Present when a submission was rejected by validation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<issue::IssueView>,
}

pub mod issue {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum IssueField {
        Description,
        Amount,
        PaidBy,
        Splits,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum IssueSeverity {
        Error,
        Warning,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IssueView {
        pub field: IssueField,
        pub message: String,
        pub severity: IssueSeverity,
    }
}

pub mod member {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub id: String,
        pub display_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: String,
        pub display_name: String,
        pub joined_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}

pub mod fund {
    use super::*;
    use member::{MemberNew, MemberView};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundNew {
        pub name: String,
        pub currency: Option<Currency>,
        /// Display name of the acting user on the new roster.
        pub display_name: String,
        #[serde(default)]
        pub members: Vec<MemberNew>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundView {
        pub id: String,
        pub name: String,
        pub currency: Currency,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub members: Vec<MemberView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundsResponse {
        pub funds: Vec<FundView>,
    }
}

pub mod transaction {
    use super::*;
    use issue::IssueView;

    /// How the total is shared.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "strategy", rename_all = "snake_case")]
    pub enum SplitRequest {
        /// Evenly between `participants`.
        Even { participants: Vec<String> },
        /// By percentages such as `"33.33"`, summing to 100.
        Percentage { shares: Vec<PercentShareNew> },
        /// Explicit signed amounts in minor units; must sum to zero.
        Custom { splits: Vec<SplitNew> },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PercentShareNew {
        pub member_id: String,
        pub percent: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitNew {
        pub member_id: String,
        pub amount_minor: i64,
    }

    /// Conversion of the entered amount into the fund currency.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExchangeRateNew {
        pub from: Currency,
        /// One `from` unit in fund currency units, e.g. `"25400.5"`.
        pub rate: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub description: String,
        /// Amount as typed by the user, in major units.
        pub amount: String,
        /// Defaults to the acting user.
        pub paid_by: Option<String>,
        pub split: SplitRequest,
        pub exchange_rate: Option<ExchangeRateNew>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitView {
        pub member_id: String,
        /// `None` when the member is no longer on the roster.
        pub display_name: Option<String>,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub description: String,
        pub total_minor: i64,
        pub currency: Currency,
        pub paid_by: String,
        pub split_kind: String,
        pub splits: Vec<SplitView>,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub voided: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub transaction: TransactionView,
        pub warnings: Vec<IssueView>,
    }

    /// Outcome of allocation and validation, never persisted.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DraftView {
        pub description: String,
        pub total_minor: Option<i64>,
        pub currency: Currency,
        pub paid_by: Option<String>,
        pub split_kind: String,
        pub splits: Vec<SplitView>,
        pub reasoning: Option<String>,
        pub acceptable: bool,
        pub issues: Vec<IssueView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParseRequest {
        pub text: String,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub member_id: String,
        /// `None` when the member is no longer on the roster.
        pub display_name: Option<String>,
        /// Positive: the member is owed money.
        pub amount_minor: i64,
        pub amount: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalancesResponse {
        pub fund_id: String,
        pub currency: Currency,
        pub balances: Vec<BalanceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
        pub amount: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementResponse {
        pub fund_id: String,
        pub currency: Currency,
        pub transfers: Vec<TransferView>,
    }
}
