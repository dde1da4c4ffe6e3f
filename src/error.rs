use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::email::EmailError;
use crate::pdf::RenderError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Invoice not found")]
    NotFound,
    #[error("Unauthorized access to invoice")]
    Forbidden,
    #[error(transparent)]
    Render(RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error("{0}")]
    Internal(String),
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Validation(v) => ApiError::MissingFields(v.missing),
            RenderError::InvalidAmount(amount) => ApiError::BadRequest(RenderError::InvalidAmount(amount).to_string()),
            other => ApiError::Render(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Missing required fields", "fields": fields }),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Auth(e) => (StatusCode::UNAUTHORIZED, json!({ "error": e.to_string() })),
            ApiError::NotFound | ApiError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, json!({ "error": "Invoice not found" }))
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": self.to_string() })),
            ApiError::Email(e) => {
                tracing::error!(error = %e, "invoice email failed");
                (StatusCode::BAD_GATEWAY, json!({ "error": "Failed to send email", "details": e.to_string() }))
            }
            ApiError::Render(_) | ApiError::Store(_) | ApiError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error", "details": self.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
