mod auth;
mod password;
mod shared;
mod token;
mod user;

use axum::{routing::post, Router};
use shared::AppState;
use std::sync::Arc;
use token::{TokenConfig, TokenManager};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user::JsonFileUserRepository;
// use user::PostgresUserRepository; // For production

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting authentication service");

    // Create shared application state with dependency injection
    let store_path = std::env::var("USER_STORE_PATH")
        .unwrap_or_else(|_| "users/people.json".to_string());
    let user_repository = Arc::new(
        JsonFileUserRepository::new(&store_path).expect("Failed to open user store"),
    );

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let user_repository = Arc::new(PostgresUserRepository::new(pool));

    let token_manager = Arc::new(TokenManager::new(TokenConfig::new()));
    let app_state = AppState::new(user_repository, token_manager);

    // build our application with the four auth routes
    let app = Router::new()
        .route("/signup", post(auth::sign_up))
        .route("/signin", post(auth::sign_in))
        .route("/refresh", post(auth::refresh_token))
        .route("/token/invalidate", post(auth::invalidate_token))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
