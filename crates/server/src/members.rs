//! Roster endpoints. Adding members is creator-only.

use api_types::member::{MemberNew, MemberView, MembersResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Member, MemberId};

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state.engine.list_members(&fund_id, &user).await?;
    Ok(Json(MembersResponse {
        members: members.iter().map(views::member).collect(),
    }))
}

pub async fn add(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path(fund_id): Path<String>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    let member = Member::new(MemberId::parse(&payload.id)?, payload.display_name, Utc::now());
    let member = state.engine.add_member(&fund_id, &user, member).await?;
    Ok((StatusCode::CREATED, Json(views::member(&member))))
}

pub async fn remove(
    Extension(user): Extension<MemberId>,
    State(state): State<ServerState>,
    Path((fund_id, member_id)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    let member_id = MemberId::parse(&member_id)?;
    state
        .engine
        .remove_member(&fund_id, &user, &member_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
