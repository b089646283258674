use serde::{Deserialize, Serialize};

/// JWT claims for short-lived access tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    pub sub: String,  // User email
    pub name: String, // Display name
    pub iat: usize,   // Issued at timestamp (standard JWT claim)
    pub exp: usize,   // Expiration timestamp (standard JWT claim)
}

/// JWT claims for long-lived refresh tokens
///
/// The `jti` is the handle for revocation: it is registered when the
/// token is minted and checked on every decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshClaims {
    pub sub: String, // User email
    pub jti: String, // Unique token id (UUID v4)
    pub iat: usize,  // Issued at timestamp (standard JWT claim)
    pub exp: usize,  // Expiration timestamp (standard JWT claim)
}
