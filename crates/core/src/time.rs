//! Lenient timestamp decoding for backend records.
//!
//! The backend emits RFC 3339 (`2025-03-01T10:00:00.000000Z`) on most routes
//! and a bare `YYYY-MM-DD HH:MM:SS` (UTC) on some. `null` and a missing field
//! both decode to `None`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse either accepted timestamp form.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// `deserialize_with` helper for `Option<DateTime<Utc>>` fields.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp '{s}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[derive(Deserialize)]
    struct Stamp {
        #[serde(default, deserialize_with = "lenient_timestamp")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn accepts_rfc3339_and_naive_forms() {
        let a = parse_timestamp("2025-03-01T10:15:00.000000Z").unwrap();
        let b = parse_timestamp("2025-03-01 10:15:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.day(), 1);
        assert_eq!(a.minute(), 15);
    }

    #[test]
    fn null_and_missing_are_none() {
        let s: Stamp = serde_json::from_str(r#"{"at": null}"#).unwrap();
        assert!(s.at.is_none());
        let s: Stamp = serde_json::from_str("{}").unwrap();
        assert!(s.at.is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Stamp>(r#"{"at": "yesterday"}"#).is_err());
    }
}
