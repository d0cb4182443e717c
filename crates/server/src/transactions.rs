//! Transactions API endpoints

use std::str::FromStr;

use api_types::transaction::{
    DraftView, ParseRequest, SplitRequest, TransactionCreated, TransactionList,
    TransactionListResponse, TransactionNew, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    EngineError, ExchangeRate, Fund, MemberId, Money, NewTransactionCmd, Percent, PercentShare,
    Split, SplitStrategy,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

const DEFAULT_PAGE_SIZE: u64 = 50;

fn strategy(split: SplitRequest) -> Result<SplitStrategy, ServerError> {
    Ok(match split {
        SplitRequest::Even { participants } => SplitStrategy::Even {
            participants: participants
                .iter()
                .map(|id| MemberId::parse(id))
                .collect::<Result<_, _>>()?,
        },
        SplitRequest::Percentage { shares } => SplitStrategy::Percentage {
            shares: shares
                .into_iter()
                .map(|share| {
                    Ok(PercentShare {
                        member_id: MemberId::parse(&share.member_id)?,
                        percent: Percent::from_str(&share.percent)?,
                    })
                })
                .collect::<Result<_, ServerError>>()?,
        },
        SplitRequest::Custom { splits } => SplitStrategy::Custom {
            splits: splits
                .into_iter()
                .map(|split| {
                    Ok(Split::new(
                        MemberId::parse(&split.member_id)?,
                        Money::new(split.amount_minor),
                    ))
                })
                .collect::<Result<_, ServerError>>()?,
        },
    })
}

fn transaction_id(value: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(value)
        .map_err(|_| EngineError::InvalidId(format!("invalid transaction id: {value}")).into())
}

/// Turns a request body into an engine command against `fund`.
fn command(fund: &Fund, user: MemberId, payload: TransactionNew) -> Result<NewTransactionCmd, ServerError> {
    let mut cmd = NewTransactionCmd::new(
        fund.id.clone(),
        user,
        payload.description,
        payload.amount,
        strategy(payload.split)?,
    );
    if let Some(paid_by) = payload.paid_by {
        cmd = cmd.paid_by(MemberId::parse(&paid_by)?);
    }
    if let Some(rate) = payload.exchange_rate {
        let value = Decimal::from_str(rate.rate.trim())
            .map_err(|_| ServerError::Generic(format!("invalid exchange rate: {}", rate.rate)))?;
        cmd = cmd.exchange_rate(ExchangeRate::new(
            views::engine_currency(rate.from),
            fund.currency,
            value,
        )?);
    }
    if let Some(key) = payload.idempotency_key {
        cmd = cmd.idempotency_key(key);
    }
    Ok(cmd)
}

pub async fn append(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let fund = state.engine.fund(&fund_id, &user).await?;
    let cmd = command(&fund, user, payload)?;
    let (tx, warnings) = state.engine.append_transaction(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionCreated {
            transaction: views::transaction(&tx, &fund.roster()),
            warnings: warnings.iter().map(views::issue).collect(),
        }),
    ))
}

/// Runs allocation and validation without storing anything.
pub async fn preview(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
    Json(payload): Json<TransactionNew>,
) -> Result<Json<DraftView>, ServerError> {
    let fund = state.engine.fund(&fund_id, &user).await?;
    let cmd = command(&fund, user, payload)?;
    let draft = state.engine.preview_transaction(&cmd).await?;

    Ok(Json(views::draft(&draft, &fund.roster())))
}

/// Parses free text with the built-in parser and returns the resulting draft.
pub async fn parse(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
    Json(payload): Json<ParseRequest>,
) -> Result<Json<DraftView>, ServerError> {
    let fund = state.engine.fund(&fund_id, &user).await?;
    let draft = state
        .engine
        .parse_transaction(&fund_id, &payload.text, &user, state.parser.as_ref())
        .await?;

    Ok(Json(views::draft(&draft, &fund.roster())))
}

pub async fn list(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let fund = state.engine.fund(&fund_id, &user).await?;
    let page = state
        .engine
        .list_transactions_page(
            &fund_id,
            &user,
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.cursor.as_deref(),
        )
        .await?;

    let roster = fund.roster();
    Ok(Json(TransactionListResponse {
        transactions: page
            .transactions
            .iter()
            .map(|tx| views::transaction(tx, &roster))
            .collect(),
        next_cursor: page.next_cursor,
    }))
}

pub async fn get(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path((fund_id, tx_id)): Path<(String, String)>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx_id = transaction_id(&tx_id)?;
    let fund = state.engine.fund(&fund_id, &user).await?;
    let tx = state.engine.transaction(&fund_id, tx_id, &user).await?;
    Ok(Json(views::transaction(&tx, &fund.roster())))
}

pub async fn void_tx(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path((fund_id, tx_id)): Path<(String, String)>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx_id = transaction_id(&tx_id)?;
    let fund = state.engine.fund(&fund_id, &user).await?;
    let tx = state.engine.void_transaction(&fund_id, tx_id, &user).await?;
    Ok(Json(views::transaction(&tx, &fund.roster())))
}
