use std::collections::HashMap;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    EngineError, Fund, MemberId, NewTransactionCmd, ParseRequest, ParsedTransaction,
    ResultEngine, Split, Transaction, TransactionDraft, TransactionParser, ValidationIssue,
    prepare_draft, splits, transactions,
};

use super::{Engine, with_tx};

/// One page of history, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    created_at: DateTime<Utc>,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

impl Engine {
    /// Allocates, validates and stores a transaction.
    ///
    /// Any `error` issue rejects the whole submission with
    /// [`EngineError::Validation`]. On success the stored transaction is
    /// returned with the warnings that were raised.
    ///
    /// Resubmitting an idempotency key returns the transaction stored the
    /// first time, without warnings.
    pub async fn append_transaction(
        &self,
        cmd: NewTransactionCmd,
    ) -> ResultEngine<(Transaction, Vec<ValidationIssue>)> {
        with_tx!(self, |db_tx| {
            let fund_model = self.require_fund(&db_tx, &cmd.fund_id, &cmd.user_id).await?;

            if let Some(key) = cmd.idempotency_key.as_deref()
                && let Some(existing) = transactions::Entity::find()
                    .filter(transactions::Column::FundId.eq(cmd.fund_id.clone()))
                    .filter(transactions::Column::IdempotencyKey.eq(key.to_string()))
                    .one(&db_tx)
                    .await?
            {
                let mut stored = self.attach_splits(&db_tx, vec![existing]).await?;
                let tx = stored
                    .pop()
                    .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
                return Ok((tx, Vec::new()));
            }

            let fund = self.load_fund(&db_tx, fund_model).await?;
            let draft = self.draft_for(&fund, &cmd);
            if !draft.is_acceptable() {
                tracing::warn!(
                    "transaction rejected in fund {}: {}",
                    fund.id,
                    draft
                        .issues
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ")
                );
                return Err(EngineError::Validation(draft.issues));
            }

            let warnings = draft.warnings();
            let tx = draft.into_transaction(&fund.id, cmd.user_id.clone())?;
            transactions::ActiveModel::from_transaction(&tx, cmd.idempotency_key.clone())
                .insert(&db_tx)
                .await?;
            for (position, split) in tx.splits.iter().enumerate() {
                let position = i32::try_from(position)
                    .map_err(|_| EngineError::InvalidSplit("too many splits".to_string()))?;
                splits::ActiveModel::from_split(tx.id, position, split)
                    .insert(&db_tx)
                    .await?;
            }

            tracing::info!(
                "transaction {} appended to fund {}: {} paid by {}",
                tx.id,
                tx.fund_id,
                tx.total_amount.format(tx.currency),
                tx.paid_by
            );
            Ok((tx, warnings))
        })
    }

    /// Runs the submission pipeline without storing anything.
    pub async fn preview_transaction(&self, cmd: &NewTransactionCmd) -> ResultEngine<TransactionDraft> {
        with_tx!(self, |db_tx| {
            let fund = self.require_fund(&db_tx, &cmd.fund_id, &cmd.user_id).await?;
            let fund = self.load_fund(&db_tx, fund).await?;
            Ok(self.draft_for(&fund, cmd))
        })
    }

    /// Asks `parser` to read `text` and previews the AI-derived result.
    pub async fn parse_transaction<P: TransactionParser>(
        &self,
        fund_id: &str,
        text: &str,
        user_id: &MemberId,
        parser: &P,
    ) -> ResultEngine<TransactionDraft> {
        let fund = self.fund(fund_id, user_id).await?;
        let request = ParseRequest {
            text: text.to_string(),
            members: fund.members.clone(),
            acting_user: user_id.clone(),
            currency: fund.currency,
        };

        let response = parser.parse(&request).await.inspect_err(|err| {
            tracing::warn!("transaction parser failed for fund {fund_id}: {err}");
        })?;
        let parsed = ParsedTransaction::from_json(&response)?;
        let cmd = NewTransactionCmd::from_parsed(fund_id, user_id.clone(), parsed);
        Ok(self.draft_for(&fund, &cmd))
    }

    /// Full non-voided history of a fund, oldest first.
    pub async fn list_transactions(
        &self,
        fund_id: &str,
        user_id: &MemberId,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            self.require_fund(&db_tx, fund_id, user_id).await?;
            self.load_history(&db_tx, fund_id).await
        })
    }

    /// Non-voided history with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(created_at DESC, transaction_id
    /// DESC)`.
    pub async fn list_transactions_page(
        &self,
        fund_id: &str,
        user_id: &MemberId,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<TransactionPage> {
        if limit == 0 {
            return Err(EngineError::InvalidCursor("limit must be > 0".to_string()));
        }
        with_tx!(self, |db_tx| {
            self.require_fund(&db_tx, fund_id, user_id).await?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::FundId.eq(fund_id.to_string()))
                .filter(transactions::Column::VoidedAt.is_null())
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = TransactionsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(transactions::Column::CreatedAt.eq(cursor.created_at))
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }

            let rows: Vec<transactions::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;
            let rows: Vec<transactions::Model> = rows.into_iter().take(limit as usize).collect();
            let out = self.attach_splits(&db_tx, rows).await?;

            let next_cursor = if has_more {
                out.last()
                    .map(|tx| TransactionsCursor {
                        created_at: tx.created_at,
                        transaction_id: tx.id.to_string(),
                    })
                    .map(|c| c.encode())
                    .transpose()?
            } else {
                None
            };

            Ok(TransactionPage {
                transactions: out,
                next_cursor,
            })
        })
    }

    /// A single transaction, voided ones included.
    pub async fn transaction(
        &self,
        fund_id: &str,
        transaction_id: Uuid,
        user_id: &MemberId,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            self.require_fund(&db_tx, fund_id, user_id).await?;
            let model = self
                .require_transaction(&db_tx, fund_id, transaction_id)
                .await?;
            let mut out = self.attach_splits(&db_tx, vec![model]).await?;
            out.pop()
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
        })
    }

    /// Soft-deletes a transaction: it stays in storage but no longer counts.
    ///
    /// Allowed for whoever recorded it, the payer and the fund creator.
    /// Voiding twice is a no-op.
    pub async fn void_transaction(
        &self,
        fund_id: &str,
        transaction_id: Uuid,
        user_id: &MemberId,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let fund = self.require_fund(&db_tx, fund_id, user_id).await?;
            let model = self
                .require_transaction(&db_tx, fund_id, transaction_id)
                .await?;
            let allowed = [&fund.created_by, &model.created_by, &model.paid_by]
                .iter()
                .any(|id| id.as_str() == user_id.as_str());
            if !allowed {
                return Err(EngineError::Forbidden(
                    "only the recorder, the payer or the fund creator can void".to_string(),
                ));
            }

            let model = if model.voided_at.is_some() {
                model
            } else {
                let mut active: transactions::ActiveModel = model.into();
                active.voided_at = ActiveValue::Set(Some(Utc::now()));
                active.voided_by = ActiveValue::Set(Some(user_id.to_string()));
                let updated = active.update(&db_tx).await?;
                tracing::info!("transaction {transaction_id} voided in fund {fund_id} by {user_id}");
                updated
            };

            let mut out = self.attach_splits(&db_tx, vec![model]).await?;
            out.pop()
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
        })
    }

    fn draft_for(&self, fund: &Fund, cmd: &NewTransactionCmd) -> TransactionDraft {
        prepare_draft(cmd, fund.currency, &fund.roster(), &self.validator)
    }

    async fn require_transaction(
        &self,
        db: &DatabaseTransaction,
        fund_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::FundId.eq(fund_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    /// Non-voided history of a fund, oldest first, splits included.
    pub(super) async fn load_history(
        &self,
        db: &DatabaseTransaction,
        fund_id: &str,
    ) -> ResultEngine<Vec<Transaction>> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::FundId.eq(fund_id.to_string()))
            .filter(transactions::Column::VoidedAt.is_null())
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .all(db)
            .await?;
        self.attach_splits(db, rows).await
    }

    /// Loads the splits of `rows` in one query, keeping the row order.
    async fn attach_splits(
        &self,
        db: &DatabaseTransaction,
        rows: Vec<transactions::Model>,
    ) -> ResultEngine<Vec<Transaction>> {
        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let split_rows = splits::Entity::find()
            .filter(splits::Column::TransactionId.is_in(ids))
            .order_by_asc(splits::Column::TransactionId)
            .order_by_asc(splits::Column::Position)
            .all(db)
            .await?;

        let mut by_tx: HashMap<String, Vec<Split>> = HashMap::new();
        for row in split_rows {
            by_tx
                .entry(row.transaction_id.clone())
                .or_default()
                .push(Split::from(row));
        }

        rows.into_iter()
            .map(|row| {
                let splits = by_tx.remove(&row.id).unwrap_or_default();
                Transaction::from_model(row, splits)
            })
            .collect()
    }
}
