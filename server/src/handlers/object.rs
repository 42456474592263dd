// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! GET/PUT/DELETE of individual calendar objects.

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use vesper_core::{EventWrite, compute_etag, etag_matches};
use vesper_ical::parse_vevent;

use super::{ICS_CONTENT_TYPE, object_href};
use crate::AppState;
use crate::error::ServerError;

/// GET: the stored object verbatim, with its validator.
pub async fn get(
    state: &AppState,
    calendar_id: &str,
    uid: &str,
) -> Result<Response, ServerError> {
    let Some(event) = state.store.events.get(calendar_id, uid).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    Ok((
        StatusCode::OK,
        [
            (header::ETAG, event.etag.clone()),
            (header::CONTENT_TYPE, ICS_CONTENT_TYPE.to_string()),
        ],
        event.raw_ical,
    )
        .into_response())
}

/// PUT: create (201) or conditionally update (204) an object in the local
/// calendar.
///
/// Remote-backed calendars are writable only through the sync engine; a
/// direct PUT against one would desynchronize the remote copy, so it is
/// refused with 403.
pub async fn put(
    state: &AppState,
    calendar_id: &str,
    uid: &str,
    headers: &HeaderMap,
    body: &str,
) -> Result<Response, ServerError> {
    let Some(calendar) = state.store.calendars.get(calendar_id).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    if !calendar.is_local {
        return Ok((
            StatusCode::FORBIDDEN,
            "remote-backed calendars are written through sync, not direct PUT",
        )
            .into_response());
    }

    let parsed = match parse_vevent(body) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            return Ok((StatusCode::BAD_REQUEST, "request body holds no VEVENT").into_response());
        }
        Err(e) => {
            return Ok(
                (StatusCode::BAD_REQUEST, format!("invalid calendar object: {e}")).into_response(),
            );
        }
    };

    let existing = state.store.events.get(&calendar.id, uid).await?;

    let if_match = headers.get(header::IF_MATCH).and_then(|v| v.to_str().ok());
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());

    match &existing {
        Some(event) => {
            if if_none_match.is_some_and(|v| v.trim() == "*") {
                return Ok(precondition_failed());
            }
            if let Some(if_match) = if_match {
                if !etag_matches(if_match, &event.etag) {
                    return Ok(precondition_failed());
                }
            }
        }
        None => {
            if if_match.is_some() {
                return Ok(precondition_failed());
            }
        }
    }

    let etag = compute_etag(body);
    let created = state
        .store
        .put_event(&EventWrite {
            calendar_id: &calendar.id,
            uid,
            etag: &etag,
            url: &object_href(&calendar.id, uid),
            raw_ical: body,
            parsed: &parsed,
        })
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::NO_CONTENT
    };
    Ok((status, [(header::ETAG, etag)], "").into_response())
}

/// DELETE: remove a local-calendar object and bump the collection ctag.
pub async fn delete(
    state: &AppState,
    calendar_id: &str,
    uid: &str,
) -> Result<Response, ServerError> {
    let Some(calendar) = state.store.calendars.get(calendar_id).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    if !calendar.is_local {
        return Ok((
            StatusCode::FORBIDDEN,
            "remote-backed calendars are written through sync, not direct DELETE",
        )
            .into_response());
    }

    if state.store.delete_event(&calendar.id, uid).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(StatusCode::NOT_FOUND.into_response())
    }
}

fn precondition_failed() -> Response {
    (
        StatusCode::PRECONDITION_FAILED,
        "Conflict: event was modified. Refresh and try again.",
    )
        .into_response()
}
