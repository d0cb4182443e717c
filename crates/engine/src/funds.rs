//! The `Fund` is a named expense pool shared by a roster of members. A member
//! can belong to many funds.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, Member, MemberId, ResultEngine, Roster, util::model_currency};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    pub id: String,
    pub name: String,
    pub created_by: MemberId,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub members: Vec<Member>,
}

impl Fund {
    pub fn new(name: String, created_by: MemberId, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_by,
            currency,
            created_at: Utc::now(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn roster(&self) -> Roster {
        Roster::new(self.members.iter().cloned())
    }

    #[must_use]
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    #[must_use]
    pub fn is_member(&self, id: &MemberId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }

    pub(crate) fn from_model(model: Model, members: Vec<Member>) -> ResultEngine<Self> {
        Ok(Self {
            currency: model_currency(&model.currency)?,
            id: model.id,
            name: model.name,
            created_by: MemberId::from(model.created_by),
            created_at: model.created_at,
            members,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "funds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub currency: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fund_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::fund_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Fund> for ActiveModel {
    fn from(fund: &Fund) -> Self {
        Self {
            id: ActiveValue::Set(fund.id.clone()),
            name: ActiveValue::Set(fund.name.clone()),
            created_by: ActiveValue::Set(fund.created_by.to_string()),
            currency: ActiveValue::Set(fund.currency.code().to_string()),
            created_at: ActiveValue::Set(fund.created_at),
        }
    }
}
