// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

/// `CalDAV` client errors.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CalDavError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status. The status is kept so
    /// callers can tell a 412 conflict from everything else.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Remote HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Precondition failed (`ETag` mismatch on a conditional request).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// XML parsing/writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Structurally valid XML that does not say what a multistatus should.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),

    /// Configuration error (unparseable base URL).
    #[error("configuration error: {0}")]
    Config(String),
}

impl CalDavError {
    /// True for the optimistic-concurrency conflict cases (HTTP 412).
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::PreconditionFailed(_) | Self::Status { status: 412, .. }
        )
    }

    /// True for responses that mean "this sync token is no longer valid".
    ///
    /// RFC 6578 allows servers to reject a token with 403 (valid-sync-token
    /// precondition), 409, or 507; some return 400. All of these are soft
    /// failures answered by falling back to a full fetch.
    #[must_use]
    pub const fn is_invalid_sync_token(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: 400 | 403 | 409 | 507,
                ..
            }
        )
    }
}

impl From<reqwest::Error> for CalDavError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<quick_xml::Error> for CalDavError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<std::io::Error> for CalDavError {
    fn from(e: std::io::Error) -> Self {
        Self::Xml(format!("IO error: {e}"))
    }
}
