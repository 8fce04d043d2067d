use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{commands, ports::ledger};

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    /// Expected failure with a message for the caller
    Status(StatusCode, String),
    /// Anything else, reported as an internal error
    Unexpected(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Status(StatusCode::NOT_FOUND, message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Status(StatusCode::BAD_REQUEST, message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Status(status, message) => (
                status,
                Json(json!({
                    "message": message,
                    "status_code": status.as_u16(),
                })),
            )
                .into_response(),
            ApiError::Unexpected(error) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (
                    status,
                    Json(json!({
                        "error": format!("Unexpected error: {error}"),
                        "status_code": status.as_u16(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

impl From<ledger::Error> for ApiError {
    fn from(err: ledger::Error) -> Self {
        match err {
            ledger::Error::AccountNotFound(account_id) => {
                tracing::error!(account_id = %account_id, "spend against unknown account");
                Self::not_found(format!(
                    "Account {account_id} does not exist. Cannot spend against it."
                ))
            }
            ledger::Error::NotEnoughPoints {
                account_id,
                requested,
                shortfall,
            } => {
                let message = format!(
                    "Account {account_id} did not have enough points to spend {requested}, {shortfall} more needed."
                );
                tracing::error!("{message}");
                Self::bad_request(message)
            }
            ledger::Error::PointsOverflow {
                account_id,
                payer,
                points,
            } => {
                let message = format!(
                    "Adding {points} points for payer {payer} would overflow the balance of account {account_id}."
                );
                tracing::warn!("{message}");
                Self::bad_request(message)
            }
            ledger::Error::Adapter(err) => {
                tracing::error!(error = ?err, "ledger adapter failure");
                Self::Unexpected(err.to_string())
            }
        }
    }
}

impl From<commands::Error> for ApiError {
    fn from(err: commands::Error) -> Self {
        match err {
            commands::Error::Ledger(err) => err.into(),
            commands::Error::InvalidRequest(message) => Self::bad_request(message),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::warn!(error = %err, "request validation error");
        Self::bad_request("Bad Request")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "request validation error");
        Self::bad_request("Bad Request")
    }
}
