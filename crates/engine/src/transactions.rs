//! Transaction primitives.
//!
//! A `Transaction` is one recorded expense of a fund: who paid, how much, and
//! how it is shared, expressed as zero-sum [`Split`]s.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, MemberId, Money, ResultEngine, Split,
    util::{model_currency, parse_uuid},
};

/// How the splits of a transaction were produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Even,
    Percentage,
    Custom,
    AiDerived,
}

impl SplitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Even => "even",
            Self::Percentage => "percentage",
            Self::Custom => "custom",
            Self::AiDerived => "ai_derived",
        }
    }
}

impl TryFrom<&str> for SplitKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "even" => Ok(Self::Even),
            "percentage" => Ok(Self::Percentage),
            "custom" => Ok(Self::Custom),
            "ai_derived" => Ok(Self::AiDerived),
            other => Err(EngineError::InvalidSplit(format!(
                "invalid split kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub fund_id: String,
    pub description: String,
    pub total_amount: Money,
    pub currency: Currency,
    pub paid_by: MemberId,
    pub split_kind: SplitKind,
    pub splits: Vec<Split>,
    pub created_by: MemberId,
    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
    pub voided_by: Option<MemberId>,
}

impl Transaction {
    pub fn is_voided(&self) -> bool {
        self.voided_at.is_some()
    }

    /// The split amount of `member` in this transaction (0 when absent).
    pub fn amount_for(&self, member: &MemberId) -> Money {
        self.splits
            .iter()
            .filter(|s| &s.member_id == member)
            .map(|s| s.amount)
            .sum()
    }

    pub(crate) fn from_model(model: Model, splits: Vec<Split>) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            fund_id: model.fund_id,
            description: model.description,
            total_amount: Money::new(model.total_minor),
            currency: model_currency(&model.currency)?,
            paid_by: MemberId::from(model.paid_by),
            split_kind: SplitKind::try_from(model.split_kind.as_str())?,
            splits,
            created_by: MemberId::from(model.created_by),
            created_at: model.created_at,
            voided_at: model.voided_at,
            voided_by: model.voided_by.map(MemberId::from),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub fund_id: String,
    pub description: String,
    pub total_minor: i64,
    pub currency: String,
    pub paid_by: String,
    pub split_kind: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub voided_at: Option<DateTimeUtc>,
    pub voided_by: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
    #[sea_orm(
        belongs_to = "super::funds::Entity",
        from = "Column::FundId",
        to = "super::funds::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Funds,
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl Related<super::funds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Funds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_transaction(tx: &Transaction, idempotency_key: Option<String>) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            fund_id: ActiveValue::Set(tx.fund_id.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            total_minor: ActiveValue::Set(tx.total_amount.minor()),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            paid_by: ActiveValue::Set(tx.paid_by.to_string()),
            split_kind: ActiveValue::Set(tx.split_kind.as_str().to_string()),
            created_by: ActiveValue::Set(tx.created_by.to_string()),
            created_at: ActiveValue::Set(tx.created_at),
            voided_at: ActiveValue::Set(tx.voided_at),
            voided_by: ActiveValue::Set(tx.voided_by.as_ref().map(ToString::to_string)),
            idempotency_key: ActiveValue::Set(idempotency_key),
        }
    }
}
