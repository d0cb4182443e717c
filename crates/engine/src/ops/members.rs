use sea_orm::{TransactionTrait, prelude::*};

use crate::{
    EngineError, Member, MemberId, ResultEngine, compute_balances, fund_members,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Adds `member` to the roster. Creator only.
    pub async fn add_member(
        &self,
        fund_id: &str,
        user_id: &MemberId,
        member: Member,
    ) -> ResultEngine<Member> {
        let display_name = normalize_required_name(&member.display_name, "member")?;
        let member = Member {
            display_name,
            ..member
        };

        with_tx!(self, |db_tx| {
            self.require_fund_creator(&db_tx, fund_id, user_id).await?;
            if self.is_member(&db_tx, fund_id, &member.id).await? {
                return Err(EngineError::ExistingKey(member.id.to_string()));
            }
            fund_members::ActiveModel::from_member(fund_id, &member)
                .insert(&db_tx)
                .await?;

            tracing::info!("member {} added to fund {fund_id}", member.id);
            Ok(member)
        })
    }

    /// Removes `member_id` from the roster.
    ///
    /// The creator may remove anyone and members may remove themselves. The
    /// creator never leaves, and nobody with a nonzero balance does either:
    /// their history would keep pointing at them.
    pub async fn remove_member(
        &self,
        fund_id: &str,
        user_id: &MemberId,
        member_id: &MemberId,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let fund = self.require_fund(&db_tx, fund_id, user_id).await?;
            if fund.created_by != user_id.as_str() && user_id != member_id {
                return Err(EngineError::Forbidden(
                    "only the fund creator can remove other members".to_string(),
                ));
            }
            if fund.created_by == member_id.as_str() {
                return Err(EngineError::Forbidden(
                    "the fund creator cannot be removed".to_string(),
                ));
            }
            if !self.is_member(&db_tx, fund_id, member_id).await? {
                return Err(EngineError::KeyNotFound(member_id.to_string()));
            }

            let history = self.load_history(&db_tx, fund_id).await?;
            let balance = compute_balances(&history, [member_id]).get(member_id);
            if !balance.is_zero() {
                return Err(EngineError::InvalidMember(format!(
                    "{member_id} still has a balance of {balance}"
                )));
            }

            fund_members::Entity::delete_by_id((fund_id.to_string(), member_id.to_string()))
                .exec(&db_tx)
                .await?;

            tracing::info!("member {member_id} removed from fund {fund_id} by {user_id}");
            Ok(())
        })
    }

    /// Roster of a fund, oldest member first.
    pub async fn list_members(&self, fund_id: &str, user_id: &MemberId) -> ResultEngine<Vec<Member>> {
        with_tx!(self, |db_tx| {
            self.require_fund(&db_tx, fund_id, user_id).await?;
            self.load_members(&db_tx, fund_id).await
        })
    }
}
