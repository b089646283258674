use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AuthService,
    types::{InvalidateRequest, RefreshRequest, RefreshResponse, SignInRequest, SignInResponse, SignUpRequest},
};
use crate::shared::{AppError, AppState};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.token_manager),
    )
}

/// HTTP handler for user registration
///
/// POST /signup
#[instrument(name = "sign_up", skip(state, request))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    info!(email = %request.email, "Sign-up request received");

    auth_service(&state).register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// HTTP handler for user authentication
///
/// POST /signin
/// Returns an access + refresh token pair
#[instrument(name = "sign_in", skip(state, request))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    info!(email = %request.email, "Sign-in request received");

    let tokens = auth_service(&state).authenticate(request).await?;

    Ok(Json(tokens))
}

/// HTTP handler for redeeming a refresh token
///
/// POST /refresh
/// Returns a fresh access token; the refresh token is not rotated
#[instrument(name = "refresh_token", skip(state, request))]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    info!("Refresh request received");

    let response = auth_service(&state).refresh_access_token(request).await?;

    Ok(Json(response))
}

/// HTTP handler for revoking a refresh token by its id
///
/// POST /token/invalidate
#[instrument(name = "invalidate_token", skip(state, request))]
pub async fn invalidate_token(
    State(state): State<AppState>,
    Json(request): Json<InvalidateRequest>,
) -> Result<Json<Value>, AppError> {
    info!(token_id = %request.uuid, "Invalidate request received");

    auth_service(&state).revoke_refresh_token(request).await?;

    Ok(Json(json!({ "message": "Token invalidated" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::post,
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn test_app() -> Router {
        let app_state = AppStateBuilder::new().build();
        Router::new()
            .route("/signup", post(sign_up))
            .route("/signin", post(sign_in))
            .route("/refresh", post(refresh_token))
            .route("/token/invalidate", post(invalidate_token))
            .with_state(app_state)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_handler() {
        let app = test_app();

        let request = post_json(
            "/signup",
            r#"{"email": "a@x.com", "name": "Alice", "password": "pw1"}"#,
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_returns_conflict() {
        let app = test_app();
        let body = r#"{"email": "a@x.com", "name": "Alice", "password": "pw1"}"#;

        let response = app.clone().oneshot(post_json("/signup", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(post_json("/signup", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_sign_up_invalid_email_returns_bad_request() {
        let app = test_app();

        let request = post_json(
            "/signup",
            r#"{"email": "nope", "name": "Alice", "password": "pw1"}"#,
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sign_up_missing_field_is_rejected() {
        let app = test_app();

        // Missing password field fails JSON extraction
        let request = post_json("/signup", r#"{"email": "a@x.com", "name": "Alice"}"#);
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_sign_up_malformed_json_is_rejected() {
        let app = test_app();

        let request = post_json("/signup", r#"{"email": "a@x.com""#);
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sign_in_handler_returns_token_pair() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/signup",
                r#"{"email": "a@x.com", "name": "Alice", "password": "pw1"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(post_json(
                "/signin",
                r#"{"email": "a@x.com", "password": "pw1"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let tokens: SignInResponse = serde_json::from_slice(&body).unwrap();
        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password_returns_not_found() {
        let app = test_app();

        app.clone()
            .oneshot(post_json(
                "/signup",
                r#"{"email": "a@x.com", "name": "Alice", "password": "pw1"}"#,
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(post_json(
                "/signin",
                r#"{"email": "a@x.com", "password": "wrong"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_handler_with_garbage_token() {
        let app = test_app();

        let response = app
            .oneshot(post_json(
                "/refresh",
                r#"{"refreshToken": "garbage.token.value"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalidate_handler_rejects_non_uuid() {
        let app = test_app();

        let response = app
            .oneshot(post_json("/token/invalidate", r#"{"uuid": "not-a-uuid"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalidate_handler_unknown_id_returns_not_found() {
        let app = test_app();

        let body = format!(r#"{{"uuid": "{}"}}"#, uuid::Uuid::new_v4());
        let response = app
            .oneshot(post_json("/token/invalidate", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
