//! Session API endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::auth::SessionStatus;
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

/// GET /api/session - Whether a credential is held, and where it came from.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<SessionStatus> {
    success(state.session.status(), state.search.generation())
}

/// POST /api/session - Store a credential and validate it against the remote.
///
/// A rejected credential is answered with 401 and the session goes back to
/// whatever it held before the attempt.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<SessionStatus> {
    let generation = state.search.generation();

    let previous = match state.session.checkpoint().await {
        Ok(checkpoint) => checkpoint,
        Err(e) => return error(e, generation),
    };
    if let Err(e) = state.session.set_credential(&request.token).await {
        return error(e, generation);
    }

    match state.session.validate(state.store.as_ref()).await {
        Ok(true) => {
            tracing::info!("Credential accepted");
            success(state.session.status(), generation)
        }
        Ok(false) => {
            tracing::warn!("Credential rejected by remote; restoring the previous session");
            if let Err(e) = state.session.restore(previous).await {
                return error(e, generation);
            }
            error(
                AppError::Unauthenticated("Credential rejected by remote".to_string()),
                generation,
            )
        }
        Err(e) => error(e, generation),
    }
}

/// DELETE /api/session - Forget the credential.
pub async fn logout(State(state): State<AppState>) -> ApiResult<SessionStatus> {
    let generation = state.search.generation();

    match state.session.clear_credential().await {
        Ok(()) => success(state.session.status(), generation),
        Err(e) => error(e, generation),
    }
}
