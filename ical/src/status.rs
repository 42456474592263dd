// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

/// VEVENT STATUS values (RFC 5545 §3.8.1.11).
///
/// `Display`/`FromStr` use the lowercase form stored in the database;
/// [`EventStatus::from_ical`] and [`EventStatus::as_ical`] speak the
/// uppercase wire form.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum EventStatus {
    /// The event is confirmed. Also the fallback for absent or unrecognized
    /// STATUS values.
    #[default]
    Confirmed,
    /// The event is tentative.
    Tentative,
    /// The event is cancelled. Cancelled events stay stored as soft state.
    Cancelled,
}

impl EventStatus {
    /// Maps a raw STATUS property value; anything unrecognized is
    /// `Confirmed`.
    #[must_use]
    pub fn from_ical(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "TENTATIVE" => Self::Tentative,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Confirmed,
        }
    }

    /// The uppercase property value for serialization.
    #[must_use]
    pub const fn as_ical(self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Tentative => "TENTATIVE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_defaults_to_confirmed() {
        assert_eq!(EventStatus::from_ical("NEEDS-ACTION"), EventStatus::Confirmed);
        assert_eq!(EventStatus::from_ical(""), EventStatus::Confirmed);
    }

    #[test]
    fn status_round_trips_through_ical_form() {
        for status in [
            EventStatus::Confirmed,
            EventStatus::Tentative,
            EventStatus::Cancelled,
        ] {
            assert_eq!(EventStatus::from_ical(status.as_ical()), status);
        }
    }

    #[test]
    fn display_uses_lowercase_database_form() {
        assert_eq!(EventStatus::Cancelled.to_string(), "cancelled");
        assert_eq!("tentative".parse::<EventStatus>().unwrap(), EventStatus::Tentative);
    }
}
