// Public API - what other modules can use
pub use handlers::{invalidate_token, refresh_token, sign_in, sign_up};
pub use service::AuthService;
pub use types::{
    InvalidateRequest, RefreshRequest, RefreshResponse, SignInRequest, SignInResponse,
    SignUpRequest,
};

// Internal modules
mod handlers;
pub mod service;
pub mod types;
