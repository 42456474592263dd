// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vesper_core::CoreError;

/// Handler-level failures that are not protocol-mapped status codes.
#[derive(Debug)]
pub enum ServerError {
    /// Store or sync failure.
    Core(CoreError),
    /// Response document assembly failure.
    Xml(String),
}

impl From<CoreError> for ServerError {
    fn from(e: CoreError) -> Self {
        Self::Core(e)
    }
}

impl From<quick_xml::Error> for ServerError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Core(e) => e.to_string(),
            Self::Xml(e) => e,
        };
        tracing::error!(error = %message, "CalDAV handler failed");
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}
