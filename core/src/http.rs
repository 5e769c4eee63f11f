//! Request plumbing shared by the client operations.
//!
//! # Design
//! `RequestLock` serializes whole request/response cycles. Each client owns
//! one by default; passing the same lock to several clients serializes them
//! together. `tokio::sync::Mutex` queues waiters in FIFO order, so the first
//! caller to ask is the first to run and no caller starves.

use std::fmt::Write;
use std::sync::Arc;

use encoding_rs::{Encoding, UTF_8};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::RequestError;

/// Method used by `send_json` callers that have no preference.
pub const DEFAULT_METHOD: &str = "POST";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A cloneable handle to one mutual-exclusion lock.
#[derive(Debug, Clone, Default)]
pub struct RequestLock {
    inner: Arc<Mutex<()>>,
}

impl RequestLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use. Released when the guard drops.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }

    /// True while some request cycle holds the lock.
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    /// True when both handles refer to the same lock.
    pub fn same_lock(&self, other: &RequestLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// A request body encoded for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub bytes: Vec<u8>,
    /// Value for the `Content-Type` header, including the charset.
    pub content_type: String,
}

/// Encodes JSON `text` with the charset named by `label`.
///
/// `label` is any WHATWG encoding label (`"utf-8"`, `"euc-kr"`, `"latin1"`,
/// ...). Characters the target charset cannot represent are written as JSON
/// `\uXXXX` escapes, so the receiver decodes the same string values.
///
/// Labels that name an encoding with no WHATWG encoder (`"utf-16"`,
/// `"utf-16le"`, `"utf-16be"`, `"replacement"`) produce UTF-8 bytes, and the
/// `Content-Type` names `utf-8` accordingly.
pub fn encode_json_body(text: &str, label: &str) -> Result<EncodedBody, RequestError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| RequestError::UnsupportedEncoding(label.to_string()))?;
    let target = encoding.output_encoding();
    let escaped;
    let (bytes, used, _) = if target == UTF_8 {
        target.encode(text)
    } else {
        escaped = escape_unmappable(text, target);
        target.encode(&escaped)
    };
    Ok(EncodedBody {
        bytes: bytes.into_owned(),
        content_type: format!("{JSON_CONTENT_TYPE}; charset={}", used.name().to_ascii_lowercase()),
    })
}

/// Replaces every character `target` cannot encode with its JSON escape.
///
/// Serialized JSON only carries non-ASCII characters inside string literals,
/// where an escape decodes to the same character.
fn escape_unmappable(text: &str, target: &'static Encoding) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let unmappable = !c.is_ascii() && target.encode(c.encode_utf8(&mut buf)).2;
        if !unmappable {
            escaped.push(c);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            let _ = write!(escaped, "\\u{unit:04x}");
        }
    }
    escaped
}

/// Joins `segments` onto `base` with exactly one `/` between each pair.
///
/// Returns `None` when `base` is empty or whitespace, and `base` unchanged
/// when there are no segments.
pub fn join_uri_segments<S: AsRef<str>>(base: &str, segments: &[S]) -> Option<String> {
    if base.trim().is_empty() {
        return None;
    }
    Some(segments.iter().fold(base.to_string(), |uri, segment| {
        format!(
            "{}/{}",
            uri.trim_end_matches('/'),
            segment.as_ref().trim_start_matches('/')
        )
    }))
}

#[cfg(test)]
mod tests {
    use encoding_rs::{EUC_KR, WINDOWS_1252};

    use super::*;

    #[test]
    fn join_normalizes_slashes() {
        assert_eq!(
            join_uri_segments("http://h/", &["/a/", "b"]).as_deref(),
            Some("http://h/a/b")
        );
        assert_eq!(
            join_uri_segments("http://h///", &["//a", "b//", "//c"]).as_deref(),
            Some("http://h/a/b/c")
        );
    }

    #[test]
    fn join_rejects_blank_base() {
        assert_eq!(join_uri_segments("", &["a"]), None);
        assert_eq!(join_uri_segments("   ", &["a"]), None);
    }

    #[test]
    fn join_without_segments_returns_base() {
        let none: [&str; 0] = [];
        assert_eq!(join_uri_segments("http://h/", &none).as_deref(), Some("http://h/"));
    }

    #[test]
    fn join_accepts_owned_segments() {
        let segments = vec!["items".to_string(), "42".to_string()];
        assert_eq!(
            join_uri_segments("http://h", &segments).as_deref(),
            Some("http://h/items/42")
        );
    }

    #[test]
    fn utf8_body_is_passed_through() {
        let body = encode_json_body(r#"{"name":"é"}"#, "utf-8").unwrap();
        assert_eq!(body.bytes, r#"{"name":"é"}"#.as_bytes());
        assert_eq!(body.content_type, "application/json; charset=utf-8");
    }

    #[test]
    fn legacy_charsets_are_encoded() {
        let text = r#"{"name":"é"}"#;
        let body = encode_json_body(text, "ISO-8859-1").unwrap();
        assert_eq!(body.content_type, "application/json; charset=windows-1252");
        assert_eq!(WINDOWS_1252.decode(&body.bytes).0, text);

        let body = encode_json_body("\"한\"", "euc-kr").unwrap();
        assert_eq!(body.content_type, "application/json; charset=euc-kr");
        assert_eq!(EUC_KR.decode(&body.bytes).0, "\"한\"");
    }

    #[test]
    fn unmappable_characters_become_json_escapes() {
        let text = r#"{"name":"한é😀"}"#;
        let body = encode_json_body(text, "latin1").unwrap();
        let wire = WINDOWS_1252.decode(&body.bytes).0;
        assert_eq!(wire, r#"{"name":"\ud55cé\ud83d\ude00"}"#);

        let decoded: serde_json::Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(decoded["name"], "한é😀");
    }

    #[test]
    fn utf16_labels_are_sent_as_utf8() {
        for label in ["utf-16", "utf-16le", "UTF-16BE"] {
            let body = encode_json_body(r#"{"name":"한"}"#, label).unwrap();
            assert_eq!(body.content_type, "application/json; charset=utf-8", "{label}");
            assert_eq!(body.bytes, r#"{"name":"한"}"#.as_bytes(), "{label}");
        }
    }

    #[test]
    fn unknown_charset_is_rejected() {
        let err = encode_json_body("{}", "klingon").unwrap_err();
        assert!(matches!(err, RequestError::UnsupportedEncoding(label) if label == "klingon"));
    }

    #[tokio::test]
    async fn cloned_locks_are_shared() {
        let lock = RequestLock::new();
        let clone = lock.clone();
        assert!(lock.same_lock(&clone));
        assert!(!lock.same_lock(&RequestLock::new()));

        let guard = lock.acquire().await;
        assert!(clone.is_held());
        drop(guard);
        assert!(!clone.is_held());
    }
}
