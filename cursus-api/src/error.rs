use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use cursus_ledger::LedgerError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    /// Maps ledger failures onto HTTP semantics: structural problems
    /// and rejected signatures are the caller's fault, everything else
    /// is ours.
    pub fn from_ledger(error: LedgerError) -> Self {
        match error {
            LedgerError::Validation(message) => AppError::BadRequest(message),
            LedgerError::Codec(e) => AppError::BadRequest(e.to_string()),
            LedgerError::Signature(e) => AppError::BadRequest(e.to_string()),
            LedgerError::NothingToExport(_) => {
                AppError::NotFound("Geen deelnemers gevonden".to_string())
            }
            other => AppError::Anyhow(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
