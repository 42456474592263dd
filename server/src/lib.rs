// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Local `CalDAV` server: serves the mirror to phones and desktop calendar
//! apps over PROPFIND/REPORT/GET/PUT/DELETE for a single principal.
//!
//! Handlers are stateless per request; every store access is an individual
//! operation or a short transaction, so concurrent requests are safe.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::pedantic
)]
#![allow(clippy::similar_names, clippy::missing_errors_doc)]

mod auth;
mod error;
mod handlers;
mod xml;

use axum::Router;
use axum::routing::any;
use vesper_core::Store;

pub use crate::auth::Credentials;
pub use crate::error::ServerError;

/// Shared server state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local mirror.
    pub store: Store,
    /// The single configured principal. `None` fails every request closed
    /// with 503 rather than serving unauthenticated.
    pub credentials: Option<Credentials>,
}

/// Mount point of the DAV tree.
pub const DAV_ROOT: &str = "/api/caldav";

/// Builds the `CalDAV` router.
///
/// PROPFIND and REPORT are also accepted tunneled as `POST` with an
/// `X-Original-Method` header, for HTTP layers that cannot route the
/// extension verbs.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/caldav", any(handlers::principal))
        .route("/api/caldav/", any(handlers::principal))
        .route("/api/caldav/calendars/{calendar_id}", any(handlers::calendar))
        .route("/api/caldav/calendars/{calendar_id}/", any(handlers::calendar))
        .route(
            "/api/caldav/calendars/{calendar_id}/{object}",
            any(handlers::object),
        )
        .with_state(state)
}
