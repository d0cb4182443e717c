use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Currency, EngineError, Fund, Member, MemberId, ResultEngine, fund_members, funds, splits,
    transactions, util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a fund owned by `creator`, who is always on the roster.
    ///
    /// `members` are added next to the creator; duplicates are ignored. Names
    /// are unique per creator, ignoring case.
    pub async fn create_fund(
        &self,
        name: &str,
        creator: Member,
        currency: Currency,
        members: Vec<Member>,
    ) -> ResultEngine<Fund> {
        let name = normalize_required_name(name, "fund")?;

        let mut fund = Fund::new(name.clone(), creator.id.clone(), currency);
        fund.members.push(creator);
        for member in members {
            if !fund.is_member(&member.id) {
                fund.members.push(member);
            }
        }

        let fund_entry: funds::ActiveModel = (&fund).into();
        with_tx!(self, |db_tx| {
            // Compared in Rust: SQLite's LOWER() only folds ASCII.
            let lowered = name.to_lowercase();
            let exists = funds::Entity::find()
                .filter(funds::Column::CreatedBy.eq(fund.created_by.to_string()))
                .all(&db_tx)
                .await?
                .iter()
                .any(|existing| existing.name.to_lowercase() == lowered);
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            fund_entry.insert(&db_tx).await?;
            for member in &fund.members {
                fund_members::ActiveModel::from_member(&fund.id, member)
                    .insert(&db_tx)
                    .await?;
            }

            tracing::info!(
                "fund {} created by {} with {} member(s)",
                fund.id,
                fund.created_by,
                fund.members.len()
            );
            Ok(fund)
        })
    }

    /// Return a fund with its roster.
    pub async fn fund(&self, fund_id: &str, user_id: &MemberId) -> ResultEngine<Fund> {
        with_tx!(self, |db_tx| {
            let model = self.require_fund(&db_tx, fund_id, user_id).await?;
            self.load_fund(&db_tx, model).await
        })
    }

    /// Funds where `user_id` is on the roster, oldest first.
    pub async fn list_funds(&self, user_id: &MemberId) -> ResultEngine<Vec<Fund>> {
        with_tx!(self, |db_tx| {
            let fund_ids: Vec<String> = fund_members::Entity::find()
                .filter(fund_members::Column::MemberId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|m| m.fund_id)
                .collect();

            let models = funds::Entity::find()
                .filter(funds::Column::Id.is_in(fund_ids))
                .order_by_asc(funds::Column::CreatedAt)
                .order_by_asc(funds::Column::Id)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(self.load_fund(&db_tx, model).await?);
            }
            Ok(out)
        })
    }

    /// Deletes a fund and its whole history. Creator only.
    pub async fn delete_fund(&self, fund_id: &str, user_id: &MemberId) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_fund_creator(&db_tx, fund_id, user_id).await?;

            // Children first; SQLite only cascades with foreign keys enabled.
            let tx_ids: Vec<String> = transactions::Entity::find()
                .filter(transactions::Column::FundId.eq(model.id.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|tx| tx.id)
                .collect();
            splits::Entity::delete_many()
                .filter(splits::Column::TransactionId.is_in(tx_ids))
                .exec(&db_tx)
                .await?;
            transactions::Entity::delete_many()
                .filter(transactions::Column::FundId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            fund_members::Entity::delete_many()
                .filter(fund_members::Column::FundId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            funds::Entity::delete_by_id(model.id.clone())
                .exec(&db_tx)
                .await?;

            tracing::info!("fund {} deleted by {user_id}", model.id);
            Ok(())
        })
    }
}
