//! Conversions between engine values and wire types.

use api_types::{
    Currency,
    balance::{BalanceView, TransferView},
    fund::FundView,
    issue::{IssueField, IssueSeverity, IssueView},
    member::MemberView,
    transaction::{DraftView, SplitView, TransactionView},
};
use engine::{
    Field, Fund, Member, MemberBalance, MemberRef, Roster, Severity, Split, Transaction, TransactionDraft,
    Transfer, ValidationIssue,
};

pub fn currency(currency: engine::Currency) -> Currency {
    match currency {
        engine::Currency::Vnd => Currency::Vnd,
        engine::Currency::Usd => Currency::Usd,
        engine::Currency::Eur => Currency::Eur,
    }
}

pub fn engine_currency(currency: Currency) -> engine::Currency {
    match currency {
        Currency::Vnd => engine::Currency::Vnd,
        Currency::Usd => engine::Currency::Usd,
        Currency::Eur => engine::Currency::Eur,
    }
}

pub fn issue(issue: &ValidationIssue) -> IssueView {
    IssueView {
        field: match issue.field {
            Field::Description => IssueField::Description,
            Field::Amount => IssueField::Amount,
            Field::PaidBy => IssueField::PaidBy,
            Field::Splits => IssueField::Splits,
        },
        message: issue.message.clone(),
        severity: match issue.severity {
            Severity::Error => IssueSeverity::Error,
            Severity::Warning => IssueSeverity::Warning,
        },
    }
}

pub fn member(member: &Member) -> MemberView {
    MemberView {
        id: member.id.to_string(),
        display_name: member.display_name.clone(),
        joined_at: member.joined_at,
    }
}

pub fn fund(fund: &Fund) -> FundView {
    FundView {
        id: fund.id.clone(),
        name: fund.name.clone(),
        currency: currency(fund.currency),
        created_by: fund.created_by.to_string(),
        created_at: fund.created_at,
        members: fund.members.iter().map(member).collect(),
    }
}

fn splits(splits: &[Split], roster: &Roster) -> Vec<SplitView> {
    splits
        .iter()
        .map(|split| SplitView {
            member_id: split.member_id.to_string(),
            display_name: match roster.resolve(&split.member_id) {
                MemberRef::Known(member) => Some(member.display_name.clone()),
                MemberRef::Unknown(_) => None,
            },
            amount_minor: split.amount.minor(),
        })
        .collect()
}

pub fn transaction(tx: &Transaction, roster: &Roster) -> TransactionView {
    TransactionView {
        id: tx.id,
        description: tx.description.clone(),
        total_minor: tx.total_amount.minor(),
        currency: currency(tx.currency),
        paid_by: tx.paid_by.to_string(),
        split_kind: tx.split_kind.as_str().to_string(),
        splits: splits(&tx.splits, roster),
        created_by: tx.created_by.to_string(),
        created_at: tx.created_at,
        voided: tx.is_voided(),
    }
}

pub fn draft(draft: &TransactionDraft, roster: &Roster) -> DraftView {
    DraftView {
        description: draft.description.clone(),
        total_minor: draft.total_amount.map(|m| m.minor()),
        currency: currency(draft.currency),
        paid_by: draft.paid_by.as_ref().map(ToString::to_string),
        split_kind: draft.split_kind.as_str().to_string(),
        splits: splits(&draft.splits, roster),
        reasoning: draft.reasoning.clone(),
        acceptable: draft.is_acceptable(),
        issues: draft.issues.iter().map(issue).collect(),
    }
}

pub fn balance(balance: &MemberBalance, currency: engine::Currency) -> BalanceView {
    BalanceView {
        member_id: balance.member_id.to_string(),
        display_name: balance.display_name.clone(),
        amount_minor: balance.amount.minor(),
        amount: balance.amount.format(currency),
    }
}

pub fn transfer(transfer: &Transfer, currency: engine::Currency) -> TransferView {
    TransferView {
        from: transfer.from.to_string(),
        to: transfer.to.to_string(),
        amount_minor: transfer.amount.minor(),
        amount: transfer.amount.format(currency),
    }
}
