// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Content-hash ETags and If-Match comparison.

use sha2::{Digest, Sha256};

/// Computes a strong validator for a calendar object body: the SHA-256 hex
/// digest of the content, wrapped in double quotes. Used for locally
/// authored objects that have no server-assigned `ETag` yet.
#[must_use]
pub fn compute_etag(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("\"{hex}\"")
}

/// Strips the weak-validator marker and surrounding quotes.
#[must_use]
pub fn normalize_etag(tag: &str) -> &str {
    let tag = tag.trim();
    let tag = tag.strip_prefix("W/").unwrap_or(tag);
    tag.trim_matches('"')
}

/// If-Match comparison: `*` matches anything, otherwise both sides are
/// normalized before comparing.
#[must_use]
pub fn etag_matches(if_match: &str, stored: &str) -> bool {
    if if_match.trim() == "*" {
        return true;
    }
    normalize_etag(if_match) == normalize_etag(stored)
}
