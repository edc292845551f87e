//! Authentication module.
//!
//! Two concerns live here: the remote credential the hub acts with
//! ([`Session`]), and the pre-shared key that guards the local API.

mod session;
mod store;

pub use session::*;
pub use store::*;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{codes, ErrorDetails, ErrorResponse};

/// Header carrying the local API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Gate for `/api`: the caller must present the configured key, either in
/// [`API_KEY_HEADER`] or as a bearer token. With no key configured the gate
/// is open.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    match presented_key(&request) {
        Some(key) if keys_match(&key, &expected) => next.run(request).await,
        Some(_) => reject("Invalid API key"),
        None => reject("Missing API key"),
    }
}

/// The key from the dedicated header, else from `Authorization: Bearer`.
fn presented_key(request: &Request) -> Option<String> {
    let headers = request.headers();
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(str::to_owned)
}

/// Key comparison whose running time does not depend on where the keys differ.
fn keys_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn reject(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHENTICATED.to_string(),
            message: message.to_string(),
            details: None,
        },
        generation: 0,
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
