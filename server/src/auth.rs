// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP Basic authentication for the single configured principal.

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::AppState;

/// The configured principal.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Credentials {
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
}

/// Validates the request against the configured principal.
///
/// No configured credentials is a deliberate fail-closed 503; a missing or
/// wrong `Authorization` header is a 401 with a Basic challenge.
///
/// # Errors
///
/// Returns the ready-to-send rejection response.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(credentials) = &state.credentials else {
        tracing::warn!("rejecting CalDAV request: no credentials configured");
        return Err(
            (StatusCode::SERVICE_UNAVAILABLE, "CalDAV credentials not configured").into_response(),
        );
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(decode_basic);

    match presented {
        Some((username, password))
            if username == credentials.username && password == credentials.password =>
        {
            Ok(())
        }
        _ => Err(unauthorized()),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"vesper\"")],
        "Unauthorized",
    )
        .into_response()
}

fn decode_basic(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
