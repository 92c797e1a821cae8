//! Conversions between instants and their wire forms.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};

pub fn to_millis(t: &DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Whether [`to_iso`] yields text that [`from_iso`] reads back: RFC 3339
/// only has four-digit years.
pub fn has_iso_form(t: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&t.year())
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn to_iso(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses any RFC 3339 timestamp and normalizes it to UTC.
pub fn from_iso(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_uses_millis_and_z() {
        let t = from_millis(1_482_000_000_123).unwrap();
        assert_eq!(to_iso(&t), "2016-12-17T18:40:00.123Z");
        assert_eq!(from_iso("2016-12-17T18:40:00.123Z"), Some(t));
        assert_eq!(to_millis(&t), 1_482_000_000_123);
    }

    #[test]
    fn offsets_normalize_to_utc() {
        let t = from_iso("2016-12-17T20:40:00.123+02:00").unwrap();
        assert_eq!(to_millis(&t), 1_482_000_000_123);
        assert!(from_iso("yesterday").is_none());
    }

    #[test]
    fn years_past_four_digits_have_no_iso_form() {
        let last = from_millis(253_402_300_799_999).unwrap();
        assert!(has_iso_form(&last));
        assert_eq!(from_iso(&to_iso(&last)), Some(last));

        let next = from_millis(253_402_300_800_000).unwrap();
        assert!(!has_iso_form(&next));
        assert!(from_iso(&to_iso(&next)).is_none());
        assert!(!has_iso_form(&from_millis(-62_167_219_200_001).unwrap()));
    }

    #[test]
    fn pre_epoch_instants() {
        let t = from_millis(-1).unwrap();
        assert_eq!(to_iso(&t), "1969-12-31T23:59:59.999Z");
    }
}
