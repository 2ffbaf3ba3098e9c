//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use store::StoreError;

use crate::auth::AuthError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No identity could be resolved from the request.
    Unauthenticated(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Resource absent or not owned by the caller.
    NotFound(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation(_) => ApiError::Internal(err.to_string()),
            _ => ApiError::Unauthenticated(err.to_string()),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::MissingField(_) => ApiError::BadRequest(err.to_string()),
            DomainError::EmptyCart => ApiError::BadRequest(err.to_string()),
            DomainError::OrderNotFound(_) => {
                ApiError::NotFound("Order not found or does not belong to user".to_string())
            }
            DomainError::Store(store_err) => match store_err {
                StoreError::ItemNotFound(_) => ApiError::NotFound(store_err.to_string()),
                StoreError::CartEntryNotFound { .. } => ApiError::NotFound(
                    "Cart item not found or does not belong to user".to_string(),
                ),
                StoreError::EmptyCart => ApiError::BadRequest(store_err.to_string()),
                StoreError::Database(_) | StoreError::Migration(_) | StoreError::Backend(_) => {
                    ApiError::Internal(store_err.to_string())
                }
            },
        }
    }
}
