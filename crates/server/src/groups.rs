//! Group API endpoints

use api_types::group::{
    GroupCreated, GroupListResponse, GroupNew, GroupUpdate, GroupView, MemberAdd,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Inr => api_types::Currency::Inr,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Yen => api_types::Currency::Yen,
        engine::Currency::Yuan => api_types::Currency::Yuan,
    }
}

fn map_currency_in(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Inr => engine::Currency::Inr,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Yen => engine::Currency::Yen,
        api_types::Currency::Yuan => engine::Currency::Yuan,
    }
}

fn view(group: engine::Group, members: Vec<String>) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name,
        description: group.description,
        currency: map_currency(group.currency),
        owner: group.owner,
        category: group.category,
        total_expenditure_minor: group.total_expenditure.cents(),
        members,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupCreated>), ServerError> {
    let members = payload.members.unwrap_or_default();
    let id = state
        .engine
        .new_group(
            &payload.name,
            payload.description.as_deref(),
            payload.currency.map(map_currency_in),
            payload.category.as_deref(),
            &user.username,
            &members,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(GroupCreated { id })))
}

#[derive(Deserialize)]
pub struct GroupGet {
    pub id: String,
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<GroupGet>,
) -> Result<Json<GroupView>, ServerError> {
    let (group, entries) = state.engine.group(&query.id, &user.username).await?;
    let members = entries.into_iter().map(|e| e.member_id).collect();
    Ok(Json(view(group, members)))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<GroupListResponse>, ServerError> {
    let groups = state.engine.groups_for_user(&user.username).await?;

    let mut result = Vec::with_capacity(groups.len());
    for group in groups {
        let (group, entries) = state.engine.group(&group.id, &user.username).await?;
        let members = entries.into_iter().map(|e| e.member_id).collect();
        result.push(view(group, members));
    }

    Ok(Json(GroupListResponse { groups: result }))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<GroupUpdate>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .update_group(
            &id,
            &user.username,
            payload.name.as_deref(),
            payload.description.as_deref(),
            payload.category.as_deref(),
        )
        .await?;

    Ok(StatusCode::OK)
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(&id, &user.username).await?;
    Ok(StatusCode::OK)
}

pub async fn add_member(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<MemberAdd>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .add_member(&id, &user.username, &payload.member_id)
        .await?;

    Ok(StatusCode::CREATED)
}

pub async fn remove_member(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((id, member)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(&id, &user.username, &member)
        .await?;

    Ok(StatusCode::OK)
}
