use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{app, run, run_with_listener, spawn_with_listener};

mod expenses;
mod groups;
mod server;
mod settlements;
mod sheet;
mod user;

pub mod types {
    pub mod group {
        pub use api_types::group::{
            GroupCreated, GroupListResponse, GroupNew, GroupUpdate, GroupView, MemberAdd,
        };
    }

    pub mod expense {
        pub use api_types::expense::{
            ExpenseCreated, ExpenseListResponse, ExpenseNew, ExpenseUpdate, ExpenseView,
            RecentExpensesQuery,
        };
    }

    pub mod settlement {
        pub use api_types::settlement::{
            SettlementCreated, SettlementListResponse, SettlementNew, SettlementView,
        };
    }

    pub mod sheet {
        pub use api_types::sheet::{BalanceSheetResponse, BalanceView, TransferView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    code: &'static str,
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::GroupNotFound(_) | EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingMember(_) | EngineError::ConcurrentModification(_) => {
            StatusCode::CONFLICT
        }
        EngineError::Database(_) | EngineError::InvariantViolation(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::MemberNotInGroup(_)
        | EngineError::InvalidMemberCount(_)
        | EngineError::InvalidSplit(_)
        | EngineError::InvalidAmount(_)
        | EngineError::NonZeroBalance(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::InvariantViolation(detail) => {
            tracing::error!("ledger invariant violated: {detail}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, error) = match self {
            ServerError::Engine(err) => {
                let code = err.code();
                (status_for_engine_error(&err), code, message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "bad_request", err),
        };

        (status, Json(Error { code, error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res = ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_group_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::GroupNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingMember("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res =
            ServerError::from(EngineError::NonZeroBalance("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_invariant_violation_maps_to_500() {
        let res =
            ServerError::from(EngineError::InvariantViolation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
