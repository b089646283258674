use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::types::{
    InvalidateRequest, RefreshRequest, RefreshResponse, SignInRequest, SignInResponse,
    SignUpRequest,
};
use crate::password;
use crate::shared::AppError;
use crate::token::TokenManager;
use crate::user::repository::UserRepository;

/// Message for failed sign-in. Shared between the unknown-user and
/// wrong-password paths so callers cannot probe which accounts exist.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Service orchestrating the four authentication use cases
pub struct AuthService {
    user_repository: Arc<dyn UserRepository + Send + Sync>,
    token_manager: Arc<TokenManager>,
}

impl AuthService {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        token_manager: Arc<TokenManager>,
    ) -> Self {
        Self {
            user_repository,
            token_manager,
        }
    }

    /// Registers a new user
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: SignUpRequest) -> Result<(), AppError> {
        request.validate()?;
        info!(email = %request.email, "Registering user");

        // store_user hashes the password and enforces uniqueness
        // atomically
        self.user_repository
            .store_user(&request.email, &request.name, &request.password)
            .await?;

        info!(email = %request.email, "User registered successfully");
        Ok(())
    }

    /// Authenticates a user and mints an access + refresh token pair
    #[instrument(skip(self, request))]
    pub async fn authenticate(&self, request: SignInRequest) -> Result<SignInResponse, AppError> {
        request.validate()?;
        info!(email = %request.email, "Authenticating user");

        let user = self
            .user_repository
            .get_user(&request.email)
            .await?
            .ok_or_else(|| {
                warn!(email = %request.email, "Sign-in for unknown user");
                AppError::NotFound(INVALID_CREDENTIALS.to_string())
            })?;

        if !password::verify_password(&request.password, &user.password_hash) {
            warn!(email = %request.email, "Sign-in with wrong password");
            return Err(AppError::NotFound(INVALID_CREDENTIALS.to_string()));
        }

        let access_token = self.token_manager.create_access_token(&user.email, &user.name)?;
        let refresh_token = self.token_manager.create_refresh_token(&user.email)?;

        info!(email = %user.email, "User authenticated successfully");
        Ok(SignInResponse {
            access_token,
            refresh_token,
        })
    }

    /// Redeems a refresh token for a fresh access token.
    ///
    /// The refresh token is read, not consumed: it stays valid until
    /// its natural expiry or explicit invalidation.
    #[instrument(skip(self, request))]
    pub async fn refresh_access_token(
        &self,
        request: RefreshRequest,
    ) -> Result<RefreshResponse, AppError> {
        request.validate()?;
        info!("Refreshing access token");

        let claims = self
            .token_manager
            .decode_refresh_token(&request.refresh_token)?;

        // The subject must still exist in the store
        let user = self
            .user_repository
            .get_user(&claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(email = %claims.sub, "Refresh for user no longer in store");
                AppError::NotFound("User not found".to_string())
            })?;

        let access_token = self.token_manager.create_access_token(&user.email, &user.name)?;

        info!(email = %user.email, "Access token refreshed successfully");
        Ok(RefreshResponse { access_token })
    }

    /// Revokes a refresh token by its unique id
    #[instrument(skip(self, request))]
    pub async fn revoke_refresh_token(&self, request: InvalidateRequest) -> Result<(), AppError> {
        request.validate()?;
        info!(token_id = %request.uuid, "Revoking refresh token");

        self.token_manager.invalidate_refresh_token(&request.uuid)?;

        info!(token_id = %request.uuid, "Refresh token revoked successfully");
        Ok(())
    }
}
