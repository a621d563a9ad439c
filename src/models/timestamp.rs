use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 style timestamp into UTC.
///
/// Offsets are honoured and a trailing `Z` means UTC. Timestamps without an
/// offset, including bare dates and SQLite's `datetime('now')` output, are
/// taken to be UTC already.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = s.strip_suffix('Z').unwrap_or(s);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parse a timestamp keeping its own wall-clock date and time.
///
/// An explicit offset is kept as written rather than shifted to UTC. `Z` and
/// offset-less timestamps read the same as with `parse_timestamp`.
pub fn parse_wall_clock(s: &str) -> Option<NaiveDateTime> {
    match DateTime::parse_from_rfc3339(s.trim()) {
        Ok(dt) => Some(dt.naive_local()),
        Err(_) => parse_timestamp(s).map(|dt| dt.naive_utc()),
    }
}

/// Fixed-width UTC representation, so stored timestamps compare correctly as text.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_accepts_common_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 6, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01T06:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T06:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T08:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T06:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T06:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 06:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-01"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("Mon, 01 Jan 2024 06:30:00 GMT"), None);
    }

    #[test]
    fn test_wall_clock_keeps_offset_local_time() {
        let local = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(1, 10, 0)
            .unwrap();
        assert_eq!(parse_wall_clock("2024-03-09T01:10:00+02:00"), Some(local));
        assert_eq!(parse_wall_clock("2024-03-09T01:10:00Z"), Some(local));
        assert_eq!(parse_wall_clock("2024-03-09T01:10:00"), Some(local));
        assert_eq!(parse_wall_clock("soon"), None);
    }

    #[test]
    fn test_formatted_timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(format_timestamp(earlier), "2024-01-01T09:00:00.000000Z");
        assert_eq!(parse_timestamp(&format_timestamp(later)), Some(later));
    }
}
