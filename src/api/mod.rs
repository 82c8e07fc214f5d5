mod auth;
mod guard;
mod health;

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::models::{AppError, AppState, CustomResponse};

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", routing::get(welcome))
        .nest("/health", health::router())
        .nest("/auth", auth::router(&state))
        .fallback(fallback_404)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn welcome() -> &'static str {
    "Welcome to API"
}

pub async fn fallback_404() -> impl IntoResponse {
    CustomResponse::<()>::empty(StatusCode::NOT_FOUND, "Endpoint not found.")
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RoleRights, TokenService};
    use crate::system::{testing, SqliteUserStore};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use chrono::Duration;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let pool = testing::memory_pool().await;
        app(Arc::new(AppState {
            users: Arc::new(SqliteUserStore::new(pool)),
            tokens: TokenService::new("test_secret", Duration::minutes(30), Duration::days(30)),
            rights: Arc::new(RoleRights::default()),
            bcrypt_cost: 4,
        }))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = test_app()
            .await
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Endpoint not found.");
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let response = test_app()
            .await
            .oneshot(Request::builder().uri("/auth/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(response).await["error"],
            "errorMessages.invalidRequestMethod"
        );
    }

    #[tokio::test]
    async fn test_health_and_welcome() {
        let app = test_app().await;
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], 200);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Welcome to API");
    }
}
