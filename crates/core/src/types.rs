use chrono::SecondsFormat;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Current time as an ISO-8601 string with millisecond precision and a
/// `Z` suffix, e.g. `2025-01-31T12:00:00.000Z`.
pub fn iso_now() -> String {
    to_iso(&chrono::Utc::now())
}

/// Format a timestamp the way outbound frames carry it.
pub fn to_iso(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
