//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `updatedAt`, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse an RFC 3339 timestamp as sent by the hub and the store.
///
/// Returns `None` for malformed input rather than failing the whole record.
#[must_use]
pub fn parse_rfc3339(value: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_parse_store_timestamp_with_nanos() {
        let ts = parse_rfc3339("2024-05-01T10:15:30.123456Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:15:30.123456+00:00");
    }

    #[test]
    fn should_convert_offset_timestamp_to_utc() {
        let ts = parse_rfc3339("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn should_return_none_for_malformed_timestamp() {
        assert!(parse_rfc3339("yesterday").is_none());
    }
}
