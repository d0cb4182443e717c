//! Fund roster rows.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::Member;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fund_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fund_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub member_id: String,
    pub display_name: String,
    pub joined_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::funds::Entity",
        from = "Column::FundId",
        to = "super::funds::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Funds,
}

impl Related<super::funds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Funds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_member(fund_id: &str, member: &Member) -> Self {
        Self {
            fund_id: ActiveValue::Set(fund_id.to_string()),
            member_id: ActiveValue::Set(member.id.to_string()),
            display_name: ActiveValue::Set(member.display_name.clone()),
            joined_at: ActiveValue::Set(member.joined_at),
        }
    }
}
