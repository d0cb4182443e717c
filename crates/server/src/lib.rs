use api_types::ErrorResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ParseError};

pub use server::{ServerState, router, run_with_listener};

mod balances;
mod funds;
mod members;
mod server;
mod transactions;
mod views;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidCursor(_) | EngineError::InvalidId(_) => StatusCode::BAD_REQUEST,
        EngineError::Parse(ParseError::Unavailable(_) | ParseError::Malformed(_)) => {
            StatusCode::BAD_GATEWAY
        }
        EngineError::Parse(_)
        | EngineError::Validation(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidSplit(_)
        | EngineError::InvalidMember(_)
        | EngineError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn body_for_engine_error(err: EngineError) -> ErrorResponse {
    let error = err.to_string();
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ErrorResponse {
                error: "internal server error".to_string(),
                issues: Vec::new(),
            }
        }
        EngineError::Validation(issues) => ErrorResponse {
            error,
            issues: issues.iter().map(views::issue).collect(),
        },
        _ => ErrorResponse {
            error,
            issues: Vec::new(),
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Generic(error) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error,
                    issues: Vec::new(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
