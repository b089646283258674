use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::revocation::RevocationSet;
use super::types::{AccessClaims, RefreshClaims};
use crate::shared::AppError;

/// Configuration for JWT token operations
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl TokenConfig {
    pub fn new() -> Self {
        // Allow configuring TTLs via env vars; short-lived access
        // tokens, long-lived refresh tokens
        let access_ttl_minutes = std::env::var("ACCESS_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(15);
        let refresh_ttl_days = std::env::var("REFRESH_TOKEN_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_ttl_minutes,
            refresh_ttl_days,
        }
    }

    /// Config with explicit TTLs, keeping the process-wide secret
    pub fn with_ttls(access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            access_ttl_minutes,
            refresh_ttl_days,
            ..Self::new()
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Mints and validates the two token kinds and tracks refresh-token
/// revocation.
///
/// The signing secret lives here for the process lifetime; all
/// decoding funnels through this one place, which is where a key-id
/// lookup would slot in if rotation were ever added.
pub struct TokenManager {
    config: TokenConfig,
    revocations: RevocationSet,
}

impl TokenManager {
    pub fn new(config: TokenConfig) -> Self {
        Self {
            config,
            revocations: RevocationSet::new(),
        }
    }

    /// Creates a short-lived access token for the given user
    #[instrument(skip(self, email, name))]
    pub fn create_access_token(&self, email: &str, name: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::minutes(self.config.access_ttl_minutes)).timestamp() as usize;

        debug!(
            ttl_minutes = self.config.access_ttl_minutes,
            exp_timestamp = exp,
            "Creating access token"
        );

        let claims = AccessClaims {
            sub: email.to_string(),
            name: name.to_string(),
            iat: now.timestamp() as usize,
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode access token");
            AppError::SigningFailure(e.to_string())
        })
    }

    /// Creates a long-lived refresh token with a fresh unique id,
    /// registering the id for later revocation
    #[instrument(skip(self, email))]
    pub fn create_refresh_token(&self, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::days(self.config.refresh_ttl_days);
        let jti = Uuid::new_v4().to_string();

        debug!(
            ttl_days = self.config.refresh_ttl_days,
            jti = %jti,
            "Creating refresh token"
        );

        let claims = RefreshClaims {
            sub: email.to_string(),
            jti: jti.clone(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode refresh token");
            AppError::SigningFailure(e.to_string())
        })?;

        self.revocations.register(&jti, expires_at.timestamp());
        Ok(token)
    }

    /// Decodes and validates a refresh token.
    ///
    /// Checks run in order: signature, expiry, revocation. Signature
    /// and expiry failures both surface as the same `NotFound` so a
    /// caller cannot tell tampering from staleness; revocation is
    /// reported distinctly because it is an expected terminal state.
    #[instrument(skip(self, token))]
    pub fn decode_refresh_token(&self, token: &str) -> Result<RefreshClaims, AppError> {
        debug!("Decoding refresh token");

        let claims = decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Failed to decode refresh token");
            AppError::NotFound("Invalid refresh token".to_string())
        })?;

        if self.revocations.is_revoked(&claims.jti) {
            debug!(jti = %claims.jti, "Refresh token is revoked");
            return Err(AppError::Revoked);
        }

        debug!(sub = %claims.sub, jti = %claims.jti, "Refresh token decoded successfully");
        Ok(claims)
    }

    /// Decodes and validates an access token.
    ///
    /// Access tokens are stateless: validity is the signature plus the
    /// expiry claim, nothing else.
    #[instrument(skip(self, token))]
    pub fn decode_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Failed to decode access token");
            AppError::NotFound("Invalid access token".to_string())
        })
    }

    /// Revokes a refresh token by its unique id.
    ///
    /// `NotFound` for an id that was never issued; idempotent success
    /// for an id that is already revoked.
    #[instrument(skip(self))]
    pub fn invalidate_refresh_token(&self, token_id: &str) -> Result<(), AppError> {
        self.revocations.revoke(token_id)
    }
}
