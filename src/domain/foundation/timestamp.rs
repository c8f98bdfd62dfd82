//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    ///
    /// Time-window logic must obtain "now" through the `Clock` port so the
    /// lifecycle passes stay testable; this is for construction-time
    /// bookkeeping fields.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn plus_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by adding the specified number of hours.
    pub fn plus_hours(&self, hours: i64) -> Self {
        Self(self.0 + Duration::hours(hours))
    }

    /// Creates a new timestamp by subtracting the specified number of hours.
    pub fn minus_hours(&self, hours: i64) -> Self {
        Self(self.0 - Duration::hours(hours))
    }

    /// Creates a new timestamp by adding the specified number of minutes.
    pub fn plus_minutes(&self, minutes: i64) -> Self {
        Self(self.0 + Duration::minutes(minutes))
    }

    /// Creates a new timestamp by subtracting the specified number of minutes.
    pub fn minus_minutes(&self, minutes: i64) -> Self {
        Self(self.0 - Duration::minutes(minutes))
    }

    /// Creates a timestamp from Unix seconds.
    pub fn from_unix_secs(secs: u64) -> Self {
        use chrono::TimeZone;
        Self(Utc.timestamp_opt(secs as i64, 0).unwrap())
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> u64 {
        self.0.timestamp() as u64
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn fixed() -> Timestamp {
        Timestamp::from_datetime(
            DateTime::parse_from_rfc3339("2024-06-03T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[test]
    fn from_datetime_preserves_value() {
        let dt = Utc::now();
        let ts = Timestamp::from_datetime(dt);
        assert_eq!(ts.as_datetime(), &dt);
    }

    #[test]
    fn is_before_and_after_work_correctly() {
        let earlier = fixed();
        let later = earlier.plus_minutes(1);

        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert!(!later.is_before(&earlier));
        assert!(!earlier.is_after(&later));
    }

    #[test]
    fn duration_since_is_signed() {
        let earlier = fixed();
        let later = earlier.plus_hours(2);

        assert_eq!(later.duration_since(&earlier), Duration::hours(2));
        assert_eq!(earlier.duration_since(&later), Duration::hours(-2));
    }

    #[test]
    fn hour_and_minute_arithmetic() {
        let ts = fixed();

        assert_eq!(ts.plus_hours(3).duration_since(&ts), Duration::hours(3));
        assert_eq!(ts.minus_hours(3).duration_since(&ts), Duration::hours(-3));
        assert_eq!(
            ts.plus_minutes(45).duration_since(&ts),
            Duration::minutes(45)
        );
        assert_eq!(
            ts.minus_minutes(45).duration_since(&ts),
            Duration::minutes(-45)
        );
    }

    #[test]
    fn plus_days_handles_negative_values() {
        let ts = fixed();
        assert_eq!(ts.plus_days(-1).duration_since(&ts), Duration::days(-1));
    }

    #[test]
    fn unix_secs_roundtrips() {
        let unix_secs = 1717408800_u64; // 2024-06-03T10:00:00Z
        let ts = Timestamp::from_unix_secs(unix_secs);
        assert_eq!(ts.as_unix_secs(), unix_secs);
        assert_eq!(ts, fixed());
    }

    #[test]
    fn serializes_to_rfc3339_json() {
        let json = serde_json::to_string(&fixed()).unwrap();
        assert!(json.contains("2024-06-03"));
    }

    #[test]
    fn deserializes_from_json() {
        let ts: Timestamp = serde_json::from_str("\"2024-06-03T10:00:00Z\"").unwrap();
        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts, fixed());
    }
}
