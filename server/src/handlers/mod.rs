// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Request dispatch: method tunneling, auth, and per-route handlers.

mod object;
mod propfind;
mod report;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::AppState;
use crate::auth::authenticate;
use crate::error::ServerError;

const DAV_CAPABILITIES: &str = "1, 2, calendar-access";
const ALLOW_METHODS: &str = "OPTIONS, GET, PUT, DELETE, PROPFIND, REPORT";
pub(crate) const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub(crate) const ICS_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// `/api/caldav/`: the principal collection.
pub async fn principal(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let method = effective_method(&method, &headers);
    if method == "OPTIONS" {
        return options_response();
    }
    if let Err(rejection) = authenticate(&state, &headers) {
        return rejection;
    }

    match method.as_str() {
        "PROPFIND" => respond(propfind::principal(&state, depth(&headers)).await),
        _ => method_not_allowed(),
    }
}

/// `/api/caldav/calendars/{calendar_id}/`: one calendar collection.
pub async fn calendar(
    State(state): State<AppState>,
    Path(calendar_id): Path<String>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Response {
    let method = effective_method(&method, &headers);
    if method == "OPTIONS" {
        return options_response();
    }
    if let Err(rejection) = authenticate(&state, &headers) {
        return rejection;
    }

    match method.as_str() {
        "PROPFIND" => respond(propfind::calendar(&state, &calendar_id, depth(&headers)).await),
        "REPORT" => respond(report::handle(&state, &calendar_id, &body).await),
        _ => method_not_allowed(),
    }
}

/// `/api/caldav/calendars/{calendar_id}/{uid}.ics`: one calendar object.
pub async fn object(
    State(state): State<AppState>,
    Path((calendar_id, object)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Response {
    let method = effective_method(&method, &headers);
    if method == "OPTIONS" {
        return options_response();
    }
    if let Err(rejection) = authenticate(&state, &headers) {
        return rejection;
    }

    // The `.ics` suffix carries the uid; anything else does not exist here.
    let Some(uid) = object.strip_suffix(".ics") else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match method.as_str() {
        "GET" => respond(object::get(&state, &calendar_id, uid).await),
        "PUT" => respond(object::put(&state, &calendar_id, uid, &headers, &body).await),
        "DELETE" => respond(object::delete(&state, &calendar_id, uid).await),
        _ => method_not_allowed(),
    }
}

/// Resolves the effective DAV method, honoring the `X-Original-Method`
/// tunneling contract for hosting layers that cannot route extension verbs.
fn effective_method(method: &Method, headers: &HeaderMap) -> String {
    if method == Method::POST {
        if let Some(original) = headers
            .get("X-Original-Method")
            .and_then(|v| v.to_str().ok())
        {
            return original.to_ascii_uppercase();
        }
    }
    method.as_str().to_ascii_uppercase()
}

fn depth(headers: &HeaderMap) -> u8 {
    match headers.get("Depth").and_then(|v| v.to_str().ok()) {
        Some("0") => 0,
        // Depth: infinity is treated as 1; the tree is only two levels deep.
        _ => 1,
    }
}

fn options_response() -> Response {
    (
        StatusCode::OK,
        [
            ("DAV", DAV_CAPABILITIES),
            (header::ALLOW.as_str(), ALLOW_METHODS),
        ],
        "",
    )
        .into_response()
}

fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOW_METHODS)],
        "",
    )
        .into_response()
}

fn respond(result: Result<Response, ServerError>) -> Response {
    result.unwrap_or_else(IntoResponse::into_response)
}

pub(crate) fn multistatus_response(xml: String) -> Response {
    (
        StatusCode::MULTI_STATUS,
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
        xml,
    )
        .into_response()
}

pub(crate) fn object_href(calendar_id: &str, uid: &str) -> String {
    format!("{}/calendars/{calendar_id}/{uid}.ics", crate::DAV_ROOT)
}
