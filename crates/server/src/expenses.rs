//! Expense API endpoints

use api_types::expense::{
    ExpenseCreated, ExpenseListResponse, ExpenseNew, ExpenseUpdate, ExpenseView,
    RecentExpensesQuery,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};
use engine::MoneyCents;
use uuid::Uuid;

use crate::{ServerError, groups::map_currency, server::ServerState, user};

fn view(expense: engine::Expense, utc: FixedOffset) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        group_id: expense.group_id,
        name: expense.name,
        description: expense.description,
        amount_minor: expense.amount.cents(),
        currency: map_currency(expense.currency),
        category: expense.category,
        date: expense.date.with_timezone(&utc),
        created_by: expense.created_by,
        paid_by: expense.paid_by,
        members: expense.members,
        per_member_minor: expense.per_member.cents(),
    }
}

fn utc_offset() -> Result<FixedOffset, ServerError> {
    FixedOffset::east_opt(0).ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let date = payload
        .date
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let id = state
        .engine
        .add_expense(
            &payload.group_id,
            &payload.name,
            payload.description.as_deref(),
            MoneyCents::new(payload.amount_minor),
            payload.category.as_deref(),
            date,
            &user.username,
            &payload.paid_by,
            &payload.members,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ExpenseCreated { id })))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<StatusCode, ServerError> {
    let update = engine::ExpenseUpdate {
        name: payload.name,
        description: payload.description,
        amount: payload.amount_minor.map(MoneyCents::new),
        category: payload.category,
        date: payload.date.map(|dt| dt.with_timezone(&Utc)),
        paid_by: payload.paid_by,
        members: payload.members,
    };
    state
        .engine
        .update_expense(&payload.group_id, id, &user.username, update)
        .await?;

    Ok(StatusCode::OK)
}

#[derive(serde::Deserialize)]
pub struct ExpenseDelete {
    pub group_id: String,
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExpenseDelete>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_expense(&query.group_id, id, &user.username)
        .await?;

    Ok(StatusCode::OK)
}

pub async fn list_for_group(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let expenses = state.engine.group_expenses(&id, &user.username).await?;

    let utc = utc_offset()?;
    Ok(Json(ExpenseListResponse {
        expenses: expenses.into_iter().map(|e| view(e, utc)).collect(),
    }))
}

pub async fn list_recent(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<RecentExpensesQuery>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let limit = query.limit.or(Some(5));
    let expenses = state.engine.user_expenses(&user.username, limit).await?;

    let utc = utc_offset()?;
    Ok(Json(ExpenseListResponse {
        expenses: expenses.into_iter().map(|e| view(e, utc)).collect(),
    }))
}
