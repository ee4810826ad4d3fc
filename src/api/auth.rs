// src/api/auth.rs — Optional bearer token on /solve

use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;

use crate::api::{types::ErrorResponse, ApiState};

/// Reject the request unless it carries the configured token. Open when no
/// token is configured.
pub fn check_auth(
    state: &ApiState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let Some(expected) = state.token.as_deref() else {
        return Ok(());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    match presented {
        Some(token) if tokens_match(token, expected) => Ok(()),
        _ => {
            tracing::debug!("rejected request without a valid bearer token");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing bearer token".into(),
                }),
            ))
        }
    }
}

/// The credential of an `Authorization: Bearer <token>` value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

/// Compare without an early exit on the first differing byte.
fn tokens_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |diff, (x, y)| diff | (x ^ y))
            == 0
}
