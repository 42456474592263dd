// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

/// `CalDAV` authentication method.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(tag = "type")]
pub enum AuthMethod {
    /// No authentication (test servers).
    #[serde(rename = "none")]
    #[default]
    None,
    /// Basic authentication (username/password).
    #[serde(rename = "basic")]
    Basic {
        /// Username for authentication.
        username: String,
        /// Password for authentication.
        password: String,
    },
}

/// Remote `CalDAV` account configuration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CalDavConfig {
    /// Absolute URL of the account's calendar home set,
    /// e.g. `https://dav.example.com/calendars/user/`.
    pub base_url: String,
    /// Authentication method.
    #[serde(default)]
    pub auth: AuthMethod,
    /// Request timeout in seconds. Every remote call is bounded by this;
    /// a stalled server surfaces as a per-request error, never a hang.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl CalDavConfig {
    /// Config for a Basic-auth account.
    #[must_use]
    pub fn basic(base_url: impl Into<String>, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.into(),
            auth: AuthMethod::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

const fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("vesper-caldav/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for CalDavConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth: AuthMethod::default(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
