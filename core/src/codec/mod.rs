//! JSON Codec: typed values to and from JSON text under one fixed rule set.
//!
//! # Design
//! All codec operations share `SETTINGS`, a process-wide immutable rule set.
//! The rules are:
//! - Type-metadata properties (`$type`, `$id`, `$ref`) embedded in incoming
//!   JSON are ignored by struct targets like any other unknown key. Map and
//!   `Value` targets keep them as ordinary entries, and a field renamed to
//!   `$ref` is filled as usual.
//! - Text is decoded straight onto the target type, so 128-bit integers
//!   survive a round trip.
//! - Date-like strings are never parsed implicitly. `serde_json` keeps them as
//!   strings; only fields that opt in through [`dates::iso8601`] become dates.
//! - Declared date fields use ISO-8601 text and treat unzoned or date-only
//!   input as UTC.
//!
//! The codec never catches its own errors; callers decide whether a failure
//! is fatal or folded into a result envelope.

pub mod dates;
pub mod numbers;
mod xml;

use chrono::SecondsFormat;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// Fixed formatting rules shared by every `JsonCodec`.
#[derive(Debug)]
pub struct CodecSettings {
    /// Fractional-second precision of declared dates on write.
    pub date_seconds: SecondsFormat,
    /// Unzoned date-time layouts accepted on read, tried in order and taken
    /// to be UTC.
    pub naive_date_formats: &'static [&'static str],
}

pub static SETTINGS: CodecSettings = CodecSettings {
    date_seconds: SecondsFormat::AutoSi,
    naive_date_formats: &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"],
};

/// Serializes and deserializes typed values using [`SETTINGS`].
///
/// Stateless; copies are free and all copies behave identically.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        JsonCodec
    }

    pub fn settings(&self) -> &'static CodecSettings {
        &SETTINGS
    }

    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(CodecError::Serialization)
    }

    pub fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        serde_json::from_str(text).map_err(CodecError::Deserialization)
    }

    pub fn deserialize_array<T: DeserializeOwned>(&self, text: &str) -> Result<Vec<T>, CodecError> {
        self.deserialize::<Vec<T>>(text)
    }

    /// Parses `xml`, converts the document to JSON and maps it onto `T`.
    ///
    /// The document root becomes a single-key object, so `T` usually wraps the
    /// root element: `<order id="7"/>` maps onto `{"order": {"id": "7"}}`.
    pub fn xml_to_json_object<T: DeserializeOwned>(&self, xml_text: &str) -> Result<T, CodecError> {
        let value = xml::document_to_value(xml_text)?;
        serde_json::from_value(value).map_err(CodecError::Deserialization)
    }
}
