//! 64-bit integers carried as JSON strings.
//!
//! Some services quote large integers so they survive JavaScript clients.
//! `string_i64` writes an `i64` as `"123"` and reads it back only from a
//! string token.

pub mod string_i64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    fn parse(text: &str) -> Result<i64, String> {
        text.parse::<i64>()
            .map_err(|_| format!("cannot unmarshal type long from {text:?}"))
    }

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(de::Error::custom)
    }

    pub mod option {
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_some(&value.to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| super::parse(&text).map_err(de::Error::custom))
                .transpose()
        }
    }
}
