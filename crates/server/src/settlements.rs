//! Settlement API endpoints

use api_types::settlement::{
    SettlementCreated, SettlementListResponse, SettlementNew, SettlementView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};
use engine::MoneyCents;

use crate::{ServerError, server::ServerState, user};

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<SettlementCreated>), ServerError> {
    let settled_at = payload
        .settled_at
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let id = state
        .engine
        .record_settlement(
            &payload.group_id,
            &user.username,
            &payload.settle_from,
            &payload.settle_to,
            MoneyCents::new(payload.amount_minor),
            settled_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(SettlementCreated { id })))
}

pub async fn list_for_group(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<SettlementListResponse>, ServerError> {
    let settlements = state.engine.group_settlements(&id, &user.username).await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    let settlements = settlements
        .into_iter()
        .map(|s| SettlementView {
            id: s.id,
            group_id: s.group_id,
            settle_from: s.settle_from,
            settle_to: s.settle_to,
            amount_minor: s.amount.cents(),
            settled_at: s.settled_at.with_timezone(&utc),
        })
        .collect();

    Ok(Json(SettlementListResponse { settlements }))
}
