use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::token::TokenManager;
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub token_manager: Arc<TokenManager>,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        token_manager: Arc<TokenManager>,
    ) -> Self {
        Self {
            user_repository,
            token_manager,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("User already exists")]
    AlreadyExists,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Token has been revoked")]
    Revoked,

    #[error("Storage error: {0}")]
    StorageFailure(String),

    #[error("Token signing error: {0}")]
    SigningFailure(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationFailed(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AlreadyExists => (StatusCode::CONFLICT, "User already exists".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Revoked => (
                StatusCode::UNAUTHORIZED,
                "Token has been revoked".to_string(),
            ),
            // Internal faults are logged with detail but never rendered to the caller
            AppError::StorageFailure(msg) => {
                error!(detail = %msg, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::SigningFailure(msg) => {
                error!(detail = %msg, "Token signing failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
