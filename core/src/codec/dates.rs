//! ISO-8601 date handling for declared date fields.
//!
//! Use through `#[serde(with = "courier_core::codec::dates::iso8601")]` on a
//! `DateTime<Utc>` field, or `dates::iso8601::option` on an
//! `Option<DateTime<Utc>>` field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::SETTINGS;

/// Formats `value` as RFC 3339 with a `Z` suffix and only as many fractional
/// digits as needed.
pub fn format_iso8601(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SETTINGS.date_seconds, true)
}

/// Parses ISO-8601 text into UTC.
///
/// Zoned input is converted to UTC. Unzoned date-time input and date-only
/// input are taken to already be UTC.
pub fn parse_iso8601(text: &str) -> Result<DateTime<Utc>, String> {
    let text = text.trim();
    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        return Ok(zoned.with_timezone(&Utc));
    }
    for format in SETTINGS.naive_date_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid ISO-8601 date: {text:?}"))
}

pub mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso8601(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_iso8601(&text).map_err(de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_some(&super::super::format_iso8601(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| super::super::parse_iso8601(&text).map_err(de::Error::custom))
                .transpose()
        }
    }
}
