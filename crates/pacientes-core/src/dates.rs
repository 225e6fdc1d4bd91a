//! Date conversion between the DNI layout (`DD/MM/YYYY`) and ISO
//! `YYYY-MM-DD` as stored.
//!
//! Conversions never fail loudly: an input that cannot be converted yields
//! `None` and callers treat the field as unavailable.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::models::UNAVAILABLE;

/// Earliest year accepted from a scanned document.
pub const MIN_YEAR: i32 = 1900;

/// Accepted textual date layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `YYYY-MM-DD`
    Iso,
    /// `DD/MM/YYYY`, as printed on the DNI
    Dni,
}

/// Convert a DNI date (`DD/MM/YYYY`) to ISO (`YYYY-MM-DD`).
///
/// Only range checks are applied (day 1-31, month 1-12, year >= 1900);
/// calendar validity such as `31/02` is not checked, matching what the
/// scanner has always accepted.
pub fn to_iso(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() || input == UNAVAILABLE {
        return None;
    }

    let parts: Vec<&str> = input.split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    let day = parse_number(day)?;
    let month = parse_number(month)?;
    let year = parse_number(year)?;

    if !(1..=31).contains(&day) || !(1..=12).contains(&month) || year < MIN_YEAR as u32 {
        return None;
    }

    Some(format!("{:04}-{:02}-{:02}", year, month, day))
}

/// Convert a stored date to `DD/MM/YYYY`.
///
/// Accepts a bare ISO date, an RFC 3339 timestamp or a
/// `YYYY-MM-DD HH:MM:SS` timestamp; only the date part is used.
pub fn to_display(input: &str) -> Option<String> {
    parse_date(input).map(|d| d.format("%d/%m/%Y").to_string())
}

/// Check that `input` is a real calendar date in `format`.
pub fn is_valid_date(input: &str, format: DateFormat) -> bool {
    let pattern = match format {
        DateFormat::Iso => "%Y-%m-%d",
        DateFormat::Dni => "%d/%m/%Y",
    };
    NaiveDate::parse_from_str(input.trim(), pattern)
        .map(|d| d.year() >= MIN_YEAR)
        .unwrap_or(false)
}

/// Canonical `YYYY-MM-DD` for a stored date or timestamp.
pub fn normalize_iso(input: &str) -> Option<String> {
    parse_date(input).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Parse the timestamp layouts found in the store.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    // Date part of an RFC 3339 value is kept as written, not shifted to UTC
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    parse_timestamp(input).map(|dt| dt.date())
}

fn parse_number(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_to_iso_pads() {
        assert_eq!(to_iso("05/09/2025").as_deref(), Some("2025-09-05"));
        assert_eq!(to_iso("5/9/2025").as_deref(), Some("2025-09-05"));
        assert_eq!(to_iso("22/09/1994").as_deref(), Some("1994-09-22"));
    }

    #[test]
    fn test_to_iso_rejects() {
        assert_eq!(to_iso(""), None);
        assert_eq!(to_iso("No disponible"), None);
        assert_eq!(to_iso("2025-09-05"), None);
        assert_eq!(to_iso("32/01/2020"), None);
        assert_eq!(to_iso("01/13/2020"), None);
        assert_eq!(to_iso("01/01/1899"), None);
        assert_eq!(to_iso("aa/01/2020"), None);
        assert_eq!(to_iso("01/01/2020/1"), None);
        assert_eq!(to_iso("-1/01/2020"), None);
    }

    #[test]
    fn test_to_iso_range_only() {
        // Range checks only, no calendar validation
        assert_eq!(to_iso("31/02/2020").as_deref(), Some("2020-02-31"));
    }

    #[test]
    fn test_to_display() {
        assert_eq!(to_display("2025-09-05").as_deref(), Some("05/09/2025"));
        assert_eq!(to_display("1994-09-22 00:00:00").as_deref(), Some("22/09/1994"));
        assert_eq!(to_display("1994-09-22T00:00:00.000Z").as_deref(), Some("22/09/1994"));
        assert_eq!(to_display("1994-09-22T23:00:00-03:00").as_deref(), Some("22/09/1994"));
        assert_eq!(to_display("22/09/1994"), None);
        assert_eq!(to_display(""), None);
    }

    #[test]
    fn test_is_valid_date() {
        assert!(is_valid_date("2020-02-29", DateFormat::Iso));
        assert!(!is_valid_date("2021-02-29", DateFormat::Iso));
        assert!(is_valid_date("29/02/2020", DateFormat::Dni));
        assert!(!is_valid_date("2020-02-29", DateFormat::Dni));
        assert!(!is_valid_date("01/01/1850", DateFormat::Dni));
    }

    #[test]
    fn test_normalize_iso() {
        assert_eq!(normalize_iso("1990-02-01 00:00:00").as_deref(), Some("1990-02-01"));
        assert_eq!(normalize_iso("1990-02-01").as_deref(), Some("1990-02-01"));
        assert_eq!(normalize_iso("garbage"), None);
    }

    #[test]
    fn test_parse_timestamp() {
        let dt = parse_timestamp("2025-03-10 09:30:00").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "09:30");
        assert!(parse_timestamp("2025-03-10").is_some());
        assert!(parse_timestamp("10/03/2025").is_none());
    }

    proptest! {
        #[test]
        fn prop_display_then_iso_round_trips(
            date in (1900i32..2100, 1u32..=12, 1u32..=28)
                .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
        ) {
            let iso = date.format("%Y-%m-%d").to_string();
            let display = to_display(&iso).unwrap();
            prop_assert_eq!(to_iso(&display), Some(iso));
        }

        #[test]
        fn prop_to_iso_never_panics(input in "\\PC*") {
            let _ = to_iso(&input);
        }
    }
}
