// Public API - what other modules can use
pub use models::{TwoFactor, User};
pub use repository::{
    InMemoryUserRepository, JsonFileUserRepository, PostgresUserRepository, UserRepository,
};

// Internal modules
pub mod models;
pub mod repository;
