use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::AppError;

/// Maximum accepted display-name length
pub const MAX_NAME_LENGTH: usize = 256;

/// Request body for POST /signup
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email)?;
        if self.name.is_empty() {
            return Err(AppError::ValidationFailed("Name is required".to_string()));
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(AppError::ValidationFailed(format!(
                "Name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }
        if self.password.is_empty() {
            return Err(AppError::ValidationFailed(
                "Password is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Request body for POST /signin
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl SignInRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(AppError::ValidationFailed(
                "Password is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Request body for POST /refresh
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl RefreshRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.refresh_token.is_empty() {
            return Err(AppError::ValidationFailed(
                "Refresh token is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Request body for POST /token/invalidate
///
/// Carries the refresh token's unique id, not the token itself.
#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    pub uuid: String,
}

impl InvalidateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        Uuid::parse_str(&self.uuid)
            .map(|_| ())
            .map_err(|_| AppError::ValidationFailed("Token id must be a UUID".to_string()))
    }
}

/// Response body for a successful sign-in
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Response body for a successful token refresh
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Validate email shape (basic validation)
///
/// Emails are stored and compared case-sensitively, so no
/// normalization happens here.
fn validate_email(email: &str) -> Result<(), AppError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(AppError::ValidationFailed(
            "Invalid email format".to_string(),
        ));
    }

    let (local, domain) = (parts[0], parts[1]);
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(AppError::ValidationFailed(
            "Invalid email format".to_string(),
        ));
    }

    Ok(())
}
