// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Content-line layer: unfolding, folding, escaping, and the
//! name/parameter/value split of RFC 5545 §3.1.

use crate::error::IcalError;

/// Maximum octets per physical line before folding.
const FOLD_AT: usize = 75;

/// Splits raw iCalendar text into unfolded logical lines.
///
/// Folded continuations (CRLF followed by SPACE or HTAB) are joined onto the
/// preceding line. Bare LF line endings are tolerated since real-world feeds
/// produce them.
#[must_use]
pub fn unfold(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for physical in raw.split('\n') {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        if let Some(continuation) = physical
            .strip_prefix(' ')
            .or_else(|| physical.strip_prefix('\t'))
        {
            if let Some(last) = lines.last_mut() {
                last.push_str(continuation);
                continue;
            }
        }
        if !physical.is_empty() {
            lines.push(physical.to_string());
        }
    }
    lines
}

/// Folds a logical line into physical lines of at most 75 octets,
/// continuation lines prefixed with a single space (RFC 5545 §3.1).
///
/// Folding happens on UTF-8 character boundaries, so a multi-byte character
/// is never split.
#[must_use]
pub fn fold_line(line: &str) -> String {
    if line.len() <= FOLD_AT {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / FOLD_AT * 3);
    let mut limit = FOLD_AT;
    let mut used = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if used + width > limit {
            out.push_str("\r\n ");
            // Continuation lines lose one octet to the leading space.
            limit = FOLD_AT - 1;
            used = 0;
        }
        out.push(ch);
        used += width;
    }
    out
}

/// Escapes a TEXT property value (RFC 5545 §3.3.11).
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Reverses [`escape_text`]. `\N` is accepted as a newline per the RFC.
#[must_use]
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}

/// A parsed content line: `NAME;PARAM=VAL;...:VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name, uppercased.
    pub name: String,
    /// Parameters in order of appearance, names uppercased, quotes stripped.
    pub params: Vec<(String, String)>,
    /// The raw property value (still escaped).
    pub value: String,
}

impl ContentLine {
    /// Parses one unfolded logical line.
    ///
    /// # Errors
    ///
    /// Returns [`IcalError::MalformedLine`] when the line has no `:`
    /// separator outside of quoted parameter values.
    pub fn parse(line: &str) -> Result<Self, IcalError> {
        let mut in_quotes = false;
        let mut colon = None;
        for (i, ch) in line.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                ':' if !in_quotes => {
                    colon = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let colon = colon.ok_or_else(|| IcalError::MalformedLine(line.to_string()))?;

        let (head, value) = line.split_at(colon);
        let value = &value[1..];

        let mut segments = split_unquoted(head, ';');
        let name = segments.next().unwrap_or_default().to_uppercase();
        if name.is_empty() {
            return Err(IcalError::MalformedLine(line.to_string()));
        }

        let mut params = Vec::new();
        for segment in segments {
            let (pname, pvalue) = match segment.split_once('=') {
                Some((n, v)) => (n, v),
                None => (segment, ""),
            };
            let pvalue = pvalue.trim_matches('"');
            params.push((pname.to_uppercase(), pvalue.to_string()));
        }

        Ok(Self {
            name,
            params,
            value: value.to_string(),
        })
    }

    /// Returns a parameter value by (case-insensitive) name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The property value with TEXT escaping removed.
    #[must_use]
    pub fn text_value(&self) -> String {
        unescape_text(&self.value)
    }
}

/// Splits on `sep` outside of double quotes.
fn split_unquoted(input: &str, sep: char) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts.into_iter()
}
