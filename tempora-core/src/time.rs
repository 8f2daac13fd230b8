use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::CoreError;

/// Serde adapter fixing booking timestamps to one canonical textual form:
/// RFC 3339 in UTC with millisecond precision and a literal `Z`
/// (`2026-03-14T09:30:00.000Z`). Clients compare these strings, so the
/// rendering must not drift with sub-second noise or offset spellings.
pub mod canonical {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Parses a caller-supplied date bound. Accepts a full RFC 3339 timestamp or
/// a bare `YYYY-MM-DD`, which is read as midnight UTC.
pub fn parse_date_bound(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(CoreError::InvalidDate(raw.to_string()))
}
