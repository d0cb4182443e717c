//! Balance and settlement endpoints

use api_types::balance::{BalancesResponse, SettlementResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::MemberId;

use crate::{ServerError, server::ServerState, views};

pub async fn get(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
) -> Result<Json<BalancesResponse>, ServerError> {
    let sheet = state.engine.balances(&fund_id, &user).await?;
    Ok(Json(BalancesResponse {
        fund_id: sheet.fund_id,
        currency: views::currency(sheet.currency),
        balances: sheet
            .balances
            .iter()
            .map(|b| views::balance(b, sheet.currency))
            .collect(),
    }))
}

pub async fn settlement(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
) -> Result<Json<SettlementResponse>, ServerError> {
    let fund = state.engine.fund(&fund_id, &user).await?;
    let transfers = state.engine.settlement(&fund_id, &user).await?;
    Ok(Json(SettlementResponse {
        fund_id: fund.id,
        currency: views::currency(fund.currency),
        transfers: transfers
            .iter()
            .map(|t| views::transfer(t, fund.currency))
            .collect(),
    }))
}
