//! Shared utility functions

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a datetime for storage
///
/// Fixed-width microsecond RFC3339 in UTC, so stored values sort
/// lexicographically in time order.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Used for bookkeeping columns (`created_at`, `updated_at`) where a
/// corrupt value should not make the whole row unreadable.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    parse_datetime(s).unwrap_or_else(|_| Utc::now())
}

/// Parse a datetime string (RFC3339 format), failing on bad input
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_or_now() {
        let valid_time = "2024-01-01T12:00:00Z";
        let parsed = parse_datetime_or_now(valid_time);
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T12:00:00+00:00");

        // Invalid time should return current time (just check it doesn't panic)
        let now_before = Utc::now();
        let parsed = parse_datetime_or_now("invalid");
        let now_after = Utc::now();
        assert!(parsed >= now_before && parsed <= now_after);
    }

    #[test]
    fn test_format_datetime_round_trips() {
        let dt = parse_datetime("2024-01-01T12:00:00.25Z").unwrap();
        let formatted = format_datetime(&dt);
        assert_eq!(formatted, "2024-01-01T12:00:00.250000Z");
        assert_eq!(parse_datetime(&formatted).unwrap(), dt);
    }

    #[test]
    fn test_parse_datetime_strict() {
        assert!(parse_datetime("2024-01-01T12:00:00+02:00").is_ok());
        assert!(parse_datetime("yesterday").is_err());
    }
}
