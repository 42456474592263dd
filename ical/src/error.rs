// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

/// Errors produced by the iCalendar codec.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum IcalError {
    /// The input has no BEGIN:VCALENDAR wrapper.
    #[error("missing BEGIN:VCALENDAR")]
    NotACalendar,

    /// A BEGIN:{0} component was never closed.
    #[error("unterminated component: {0}")]
    UnterminatedComponent(String),

    /// An END line did not match the innermost open component.
    #[error("mismatched END:{0}")]
    MismatchedEnd(String),

    /// A content line has no name/value separator.
    #[error("malformed content line: {0:?}")]
    MalformedLine(String),

    /// A date or date-time value could not be parsed.
    #[error("invalid date-time {value:?}: {reason}")]
    InvalidDateTime {
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A required property is missing from the component.
    #[error("missing required property: {0}")]
    MissingProperty(&'static str),
}
