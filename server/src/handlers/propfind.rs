// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! PROPFIND on the principal and on calendar collections.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vesper_core::Calendar;

use super::{ICS_CONTENT_TYPE, multistatus_response, object_href};
use crate::AppState;
use crate::error::ServerError;
use crate::xml::{DavProp, ResponseEntry, render_multistatus};

/// Principal PROPFIND: who the principal is and where its calendars live.
/// Depth 1 additionally lists the calendar collections.
pub async fn principal(state: &AppState, depth: u8) -> Result<Response, ServerError> {
    // First use of the DAV tree; make sure the local calendar exists.
    state.store.calendars.ensure_local().await?;

    let root = format!("{}/", crate::DAV_ROOT);
    let mut entries = vec![
        ResponseEntry::new(root.clone())
            .prop(DavProp::ResourceType {
                calendar: false,
                principal: true,
            })
            .prop(DavProp::CurrentUserPrincipal(root.clone()))
            .prop(DavProp::CalendarHomeSet(root)),
    ];

    if depth >= 1 {
        for calendar in state.store.calendars.list().await? {
            entries.push(calendar_entry(&calendar));
        }
    }

    Ok(multistatus_response(render_multistatus(&entries)?))
}

/// Calendar PROPFIND: the collection's own properties, plus one entry per
/// contained event at Depth 1. Listings carry etag and content type only;
/// calendar-data is never included at this level.
pub async fn calendar(
    state: &AppState,
    calendar_id: &str,
    depth: u8,
) -> Result<Response, ServerError> {
    let Some(calendar) = state.store.calendars.get(calendar_id).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let mut entries = vec![calendar_entry(&calendar)];

    if depth >= 1 {
        for event in state.store.events.list_for_calendar(&calendar.id).await? {
            entries.push(
                ResponseEntry::new(object_href(&calendar.id, &event.uid))
                    .prop(DavProp::GetETag(event.etag))
                    .prop(DavProp::GetContentType(ICS_CONTENT_TYPE.to_string())),
            );
        }
    }

    Ok(multistatus_response(render_multistatus(&entries)?))
}

fn calendar_entry(calendar: &Calendar) -> ResponseEntry {
    let mut entry = ResponseEntry::new(format!(
        "{}/calendars/{}/",
        crate::DAV_ROOT,
        calendar.id
    ))
    .prop(DavProp::ResourceType {
        calendar: true,
        principal: false,
    })
    .prop(DavProp::DisplayName(calendar.display_name.clone()))
    .prop(DavProp::SupportedComponentsVEvent);

    if let Some(ctag) = &calendar.ctag {
        entry = entry.prop(DavProp::GetCTag(ctag.clone()));
    }
    if let Some(color) = &calendar.color {
        entry = entry.prop(DavProp::CalendarColor(color.clone()));
    }
    entry
}
