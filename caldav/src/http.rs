// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication, timeout, and `ETag` handling.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

use crate::config::{AuthMethod, CalDavConfig};
use crate::error::CalDavError;
use crate::types::ETag;

/// Body bytes kept when turning an error response into a message.
const ERROR_BODY_LIMIT: usize = 512;

/// HTTP client for `CalDAV` operations.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: CalDavConfig,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client creation fails.
    pub fn new(config: CalDavConfig) -> Result<Self, CalDavError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    /// Builds a request with authentication headers.
    pub fn build_request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut req = self.client.request(method, url);

        match &self.config.auth {
            AuthMethod::Basic { username, password } => {
                req = req.basic_auth(username, Some(password));
            }
            AuthMethod::None => {}
        }

        req
    }

    /// The PROPFIND extension method.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the method name is a valid token.
    pub fn propfind() -> Result<Method, CalDavError> {
        Method::from_bytes(b"PROPFIND").map_err(|e| CalDavError::Http(format!("Invalid method: {e}")))
    }

    /// The REPORT extension method.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the method name is a valid token.
    pub fn report() -> Result<Method, CalDavError> {
        Method::from_bytes(b"REPORT").map_err(|e| CalDavError::Http(format!("Invalid method: {e}")))
    }

    /// Executes a request and maps error statuses.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::PreconditionFailed`] for 412 and
    /// [`CalDavError::Status`] for any other non-success status, so callers
    /// always see the remote status code.
    pub async fn execute(&self, req: RequestBuilder) -> Result<Response, CalDavError> {
        let resp = req.send().await?;

        match resp.status() {
            StatusCode::OK
            | StatusCode::CREATED
            | StatusCode::NO_CONTENT
            | StatusCode::MULTI_STATUS => Ok(resp),
            StatusCode::PRECONDITION_FAILED => Err(CalDavError::PreconditionFailed(
                resp.headers()
                    .get("ETag")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown")
                    .to_string(),
            )),
            status => {
                let mut body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read response".to_string());
                if body.len() > ERROR_BODY_LIMIT {
                    let mut end = ERROR_BODY_LIMIT;
                    while !body.is_char_boundary(end) {
                        end -= 1;
                    }
                    body.truncate(end);
                }
                Err(CalDavError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Adds an If-Match header for conditional updates.
    pub fn if_match(req: RequestBuilder, etag: &ETag) -> RequestBuilder {
        req.header("If-Match", etag.as_str())
    }

    /// Adds If-None-Match: * so a create never overwrites an existing
    /// resource.
    pub fn if_none_match_any(req: RequestBuilder) -> RequestBuilder {
        req.header("If-None-Match", "*")
    }

    /// Extracts the `ETag` response header, if present.
    #[must_use]
    pub fn extract_etag(resp: &Response) -> Option<ETag> {
        resp.headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(|s| ETag::new(s.to_string()))
    }
}
