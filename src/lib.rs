// Library crate for the credential and session service
// This file exposes the public API for integration tests

pub mod auth;
pub mod password;
pub mod shared;
pub mod token;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use auth::AuthService;
pub use shared::{AppError, AppState};
pub use token::{TokenConfig, TokenManager};
pub use user::{InMemoryUserRepository, JsonFileUserRepository, User, UserRepository};
