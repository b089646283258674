// Public API - what other modules can use
pub use manager::{TokenConfig, TokenManager};
pub use types::{AccessClaims, RefreshClaims};

// Internal modules
mod manager;
mod revocation;
mod types;
