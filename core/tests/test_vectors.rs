//! Verify the pure helpers against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file lists named cases with inputs and the expected output;
//! `null` means the helper must report an absent or rejected result.

use chrono::{DateTime, Utc};
use courier_core::codec::dates::{format_iso8601, iso8601};
use courier_core::{join_uri_segments, JsonCodec};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Stamp {
    #[serde(with = "iso8601")]
    at: DateTime<Utc>,
}

fn cases(raw: &str) -> Vec<serde_json::Value> {
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

// ---------------------------------------------------------------------------
// URI joining
// ---------------------------------------------------------------------------

#[test]
fn join_uri_test_vectors() {
    for case in cases(include_str!("../../test-vectors/join_uri.json")) {
        let name = case["name"].as_str().unwrap();
        let base = case["base"].as_str().unwrap();
        let segments: Vec<String> = serde_json::from_value(case["segments"].clone()).unwrap();

        let joined = join_uri_segments(base, &segments);
        assert_eq!(joined.as_deref(), case["expected"].as_str(), "{name}");
    }
}

#[test]
fn joined_uris_never_double_slash_between_segments() {
    for case in cases(include_str!("../../test-vectors/join_uri.json")) {
        let segments: Vec<String> = serde_json::from_value(case["segments"].clone()).unwrap();
        let Some(joined) = join_uri_segments(case["base"].as_str().unwrap(), &segments) else {
            continue;
        };
        if segments.is_empty() {
            continue;
        }
        let path = joined.split_once("://").map(|(_, rest)| rest).unwrap_or(&joined);
        assert!(!path.contains("//"), "{joined}");
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

#[test]
fn date_test_vectors() {
    let codec = JsonCodec::new();
    for case in cases(include_str!("../../test-vectors/dates.json")) {
        let name = case["name"].as_str().unwrap();
        let text = serde_json::json!({ "at": case["input"] }).to_string();
        let parsed = codec.deserialize::<Stamp>(&text);

        match case["expected"].as_str() {
            Some(expected) => {
                let stamp = parsed.unwrap_or_else(|e| panic!("{name}: {e}"));
                assert_eq!(format_iso8601(&stamp.at), expected, "{name}");

                let round_trip: Stamp = codec.deserialize(&codec.serialize(&stamp).unwrap()).unwrap();
                assert_eq!(round_trip, stamp, "{name}: round trip");
            }
            None => assert!(parsed.is_err(), "{name}: expected rejection"),
        }
    }
}
