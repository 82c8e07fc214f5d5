use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use tracing::{debug, warn};

use crate::core::{Capability, Subject};
use crate::models::{AccountStatus, AppError, AppState, AuthError};

/// Wraps `route` so that every call must present a valid token, hold
/// `capability` (when given) and belong to an active account. Admitted
/// requests carry the verified [`Subject`] as an extension.
pub fn guarded(
    state: &Arc<AppState>,
    capability: Option<Capability>,
    route: MethodRouter<Arc<AppState>>,
) -> MethodRouter<Arc<AppState>> {
    route.route_layer(middleware::from_fn_with_state(
        state.clone(),
        move |state: State<Arc<AppState>>, request: Request, next: Next| {
            authorize(state, capability, request, next)
        },
    ))
}

pub async fn authorize(
    State(state): State<Arc<AppState>>,
    capability: Option<Capability>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let subject = admit(&state, capability, token.as_deref()).await?;
    debug!("Admitted {} ({})", subject.user_id, subject.role);
    request.extensions_mut().insert(subject);
    Ok(next.run(request).await)
}

/// The raw `Authorization` value. A `Bearer ` prefix is tolerated.
fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    Ok((!token.is_empty()).then(|| token.to_string()))
}

/// Decides whether a call may proceed. Terminal on the first failing check:
/// token presence, token validity, capability, then live account status.
pub async fn admit(
    state: &AppState,
    capability: Option<Capability>,
    token: Option<&str>,
) -> Result<Subject, AuthError> {
    let token = token.ok_or(AuthError::Unauthenticated)?;

    let subject = state.tokens.verify(token).map_err(|e| {
        debug!("Token verification failed: {}", e);
        AuthError::from(e)
    })?;

    if let Some(required) = capability {
        if !state.rights.allows(&subject.role, required) {
            warn!(
                "Role '{}' of {} lacks capability '{}'",
                subject.role, subject.user_id, required
            );
            return Err(AuthError::Forbidden);
        }
    }

    let account = state
        .users
        .find_by_id(&subject.user_id)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    match account.status {
        AccountStatus::Active => Ok(subject),
        AccountStatus::Inactive => Err(AuthError::AccountInactive),
        AccountStatus::Deleted => Err(AuthError::AccountGone),
    }
}
