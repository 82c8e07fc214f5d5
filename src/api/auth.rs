use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing, Extension, Json, Router,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::guard::guarded;
use crate::core::Subject;
use crate::models::{AppError, AppState, Credentials, CustomResponse, NewUser, SignupRequest};

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", routing::post(signup))
        .route("/login", routing::post(login))
        .route("/me", guarded(state, None, routing::get(me)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: String,
    pub full_name: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn signup(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<CustomResponse<()>, AppError> {
    let Json(request) = payload?;
    let email = request.email.trim().to_lowercase();
    debug!("Signup for {}", email);

    let cost = app_state.bcrypt_cost;
    let password = request.password;
    let hashed_password = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

    let user = app_state
        .users
        .create(NewUser {
            full_name: request.fullname,
            email,
            hashed_password,
        })
        .await?;
    info!("User created: {}", user.id);

    Ok(CustomResponse::empty(StatusCode::OK, "Signed up"))
}

pub async fn login(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<CustomResponse<LoginResponse>, AppError> {
    let Json(credentials) = payload?;
    let email = credentials.email.trim().to_lowercase();
    debug!("Login attempt: {:?}", credentials);

    let user = app_state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let hashed = user.hashed_password.clone();
    let password = credentials.password;
    let matches = match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed)).await? {
        Ok(matches) => matches,
        Err(e) => {
            warn!("Stored hash for {} is unusable: {}", user.id, e);
            false
        }
    };
    if !matches {
        return Err(AppError::IncorrectPassword);
    }

    let tokens = app_state.tokens.issue_pair(&user.id, &user.role)?;
    info!("User {} logged in", user.id);

    Ok(CustomResponse::api(
        StatusCode::OK,
        "Logged in",
        LoginResponse {
            user_id: user.id,
            full_name: user.full_name,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
    ))
}

pub async fn me(Extension(subject): Extension<Subject>) -> CustomResponse<Subject> {
    CustomResponse::api(StatusCode::OK, "Current user", subject)
}
