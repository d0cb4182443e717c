//! Fund API endpoints

use api_types::fund::{FundNew, FundView, FundsResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Member, MemberId};

use crate::{ServerError, server::ServerState, views};

/// Handle requests for creating a new fund owned by the acting member.
pub async fn fund_new(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Json(payload): Json<FundNew>,
) -> Result<(StatusCode, Json<FundView>), ServerError> {
    let now = Utc::now();
    let creator = Member::new(user, payload.display_name, now);
    let members = payload
        .members
        .into_iter()
        .map(|m| Ok(Member::new(MemberId::parse(&m.id)?, m.display_name, now)))
        .collect::<Result<Vec<_>, ServerError>>()?;
    let currency = views::engine_currency(payload.currency.unwrap_or_default());

    let fund = state
        .engine
        .create_fund(&payload.name, creator, currency, members)
        .await?;

    Ok((StatusCode::CREATED, Json(views::fund(&fund))))
}

/// Handle requests for listing the funds of the acting member
pub async fn list(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
) -> Result<Json<FundsResponse>, ServerError> {
    let funds = state.engine.list_funds(&user).await?;
    Ok(Json(FundsResponse {
        funds: funds.iter().map(views::fund).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
) -> Result<Json<FundView>, ServerError> {
    let fund = state.engine.fund(&fund_id, &user).await?;
    Ok(Json(views::fund(&fund)))
}

pub async fn remove(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_fund(&fund_id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
