//! RFC3339 timestamp helpers.

use chrono::{DateTime, Utc};

/// Returns the current UTC time as an RFC3339 string.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Parses an RFC3339 timestamp into a UTC datetime.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let ts = iso_timestamp();
        let parsed = parse_timestamp(&ts);
        assert!(parsed.is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("not a timestamp").is_err());
    }
}
