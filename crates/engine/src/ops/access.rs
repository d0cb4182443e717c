use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};

use crate::{EngineError, Fund, Member, MemberId, ResultEngine, fund_members, funds};

use super::Engine;

impl Engine {
    /// Returns the fund when `user_id` is on its roster. Funds the user cannot
    /// see are reported as missing.
    pub(super) async fn require_fund(
        &self,
        db: &DatabaseTransaction,
        fund_id: &str,
        user_id: &MemberId,
    ) -> ResultEngine<funds::Model> {
        let model = funds::Entity::find_by_id(fund_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("fund not exists".to_string()))?;
        if !self.is_member(db, fund_id, user_id).await? {
            return Err(EngineError::KeyNotFound("fund not exists".to_string()));
        }
        Ok(model)
    }

    /// Like [`require_fund`](Self::require_fund), but only the creator passes.
    pub(super) async fn require_fund_creator(
        &self,
        db: &DatabaseTransaction,
        fund_id: &str,
        user_id: &MemberId,
    ) -> ResultEngine<funds::Model> {
        let model = self.require_fund(db, fund_id, user_id).await?;
        if model.created_by != user_id.as_str() {
            return Err(EngineError::Forbidden(
                "only the fund creator can do this".to_string(),
            ));
        }
        Ok(model)
    }

    pub(super) async fn is_member(
        &self,
        db: &DatabaseTransaction,
        fund_id: &str,
        member_id: &MemberId,
    ) -> ResultEngine<bool> {
        fund_members::Entity::find_by_id((fund_id.to_string(), member_id.to_string()))
            .one(db)
            .await
            .map(|model| model.is_some())
            .map_err(Into::into)
    }

    /// Roster of a fund, oldest member first.
    pub(super) async fn load_members(
        &self,
        db: &DatabaseTransaction,
        fund_id: &str,
    ) -> ResultEngine<Vec<Member>> {
        let models = fund_members::Entity::find()
            .filter(fund_members::Column::FundId.eq(fund_id.to_string()))
            .order_by_asc(fund_members::Column::JoinedAt)
            .order_by_asc(fund_members::Column::MemberId)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Member::from).collect())
    }

    pub(super) async fn load_fund(
        &self,
        db: &DatabaseTransaction,
        model: funds::Model,
    ) -> ResultEngine<Fund> {
        let members = self.load_members(db, &model.id).await?;
        Fund::from_model(model, members)
    }
}
