//! Transaction splits.
//!
//! A [`Split`] is a single member's signed share of a
//! [`Transaction`](crate::Transaction).
//!
//! Amounts are signed integer **minor units**:
//! - positive values mean the member paid more than their share (is owed)
//! - negative values mean the member owes money
//!
//! Within one transaction the splits sum to exactly zero. Every change to a
//! balance happens via splits.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MemberId, Money};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Split {
    pub member_id: MemberId,
    pub amount: Money,
}

impl Split {
    pub fn new(member_id: MemberId, amount: Money) -> Self {
        Self { member_id, amount }
    }
}

/// Sum of the split amounts. Zero for a balanced transaction.
pub fn splits_sum(splits: &[Split]) -> Money {
    splits.iter().map(|s| s.amount).sum()
}

/// Like [`splits_sum`], `None` when the sum leaves the `i64` range.
pub fn checked_splits_sum(splits: &[Split]) -> Option<Money> {
    splits
        .iter()
        .try_fold(Money::ZERO, |acc, s| acc.checked_add(s.amount))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub member_id: String,
    pub amount_minor: i64,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_split(transaction_id: Uuid, position: i32, split: &Split) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            transaction_id: ActiveValue::Set(transaction_id.to_string()),
            member_id: ActiveValue::Set(split.member_id.to_string()),
            amount_minor: ActiveValue::Set(split.amount.minor()),
            position: ActiveValue::Set(position),
        }
    }
}

impl From<Model> for Split {
    fn from(model: Model) -> Self {
        Self {
            member_id: MemberId::from(model.member_id),
            amount: Money::new(model.amount_minor),
        }
    }
}
