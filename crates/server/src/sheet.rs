//! Balance sheet endpoint: current balances plus the suggested transfers
//! that would settle the group.

use api_types::sheet::{BalanceSheetResponse, BalanceView, TransferView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState, user};

pub async fn balance_sheet(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<BalanceSheetResponse>, ServerError> {
    let (entries, transfers) = state.engine.balance_sheet(&id, &user.username).await?;

    let balances = entries
        .into_iter()
        .map(|entry| BalanceView {
            member_id: entry.member_id,
            amount_minor: entry.amount.cents(),
            status: entry.status.as_str().to_string(),
        })
        .collect();
    let transfers = transfers
        .into_iter()
        .map(|t| TransferView {
            from: t.from,
            to: t.to,
            amount_minor: t.amount.cents(),
        })
        .collect();

    Ok(Json(BalanceSheetResponse { balances, transfers }))
}
