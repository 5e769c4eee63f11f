//! Typed JSON-over-HTTP client with single-in-flight request execution.
//!
//! # Design
//! `JsonHttpClient` owns one `reqwest::Client` and one `RequestLock`. Every
//! operation holds the lock for its entire body: payload encoding, the network
//! round-trip, reading the body and decoding it. At most one exchange per lock
//! is in progress at any time, and results come back in lock order.
//!
//! Operations never return `Err`. Transport and codec failures are folded into
//! the returned `HttpResultData` with `status_code == -1`, the failure message
//! as the body, and a `FailureKind`. The lock guard is a local, so it is
//! released on every exit path.

use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::JsonCodec;
use crate::config::ClientConfig;
use crate::error::{ClientError, RequestError};
use crate::http::{self, RequestLock, DEFAULT_METHOD, JSON_CONTENT_TYPE};
use crate::types::HttpResultData;

const OK: i32 = 200;

/// A response that arrived, before any decoding.
struct RawResponse {
    status: u16,
    body: String,
}

/// Cloning yields a handle that shares the transport and the lock.
#[derive(Debug, Clone)]
pub struct JsonHttpClient {
    transport: reqwest::Client,
    lock: RequestLock,
    codec: JsonCodec,
    config: ClientConfig,
}

impl JsonHttpClient {
    /// Builds a client with the legacy timeout coupling.
    ///
    /// A zero `timeout` uses the transport defaults with strict certificate
    /// validation. Any other value applies that timeout **and disables server
    /// certificate validation**. Use [`JsonHttpClient::with_config`] to set the
    /// two independently.
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::from_timeout(timeout))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_lock(config, RequestLock::new())
    }

    /// Builds a client that shares `lock` with every other client given the
    /// same lock, so requests across all of them run one at a time.
    pub fn with_lock(config: ClientConfig, lock: RequestLock) -> Result<Self, ClientError> {
        let transport = config.build_transport().map_err(ClientError::Build)?;
        Ok(Self {
            transport,
            lock,
            codec: JsonCodec::new(),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn lock(&self) -> &RequestLock {
        &self.lock
    }

    pub fn codec(&self) -> &JsonCodec {
        &self.codec
    }

    /// Sends `payload` as a JSON body and returns the raw response.
    ///
    /// With `payload == None` no body is sent. `text_encoding` is a charset
    /// label such as `"utf-8"`; `method` is the HTTP method text. `model` and
    /// `model_list` are never populated by this operation.
    pub async fn send_json<T: Serialize>(
        &self,
        payload: Option<&T>,
        url: &str,
        text_encoding: &str,
        method: &str,
    ) -> HttpResultData<T> {
        let _guard = self.lock.acquire().await;
        match self.try_send_json(payload, url, text_encoding, method).await {
            Ok(response) => HttpResultData::from_response(response.status, response.body),
            Err(err) => fold_failure(method, url, err),
        }
    }

    /// [`send_json`](Self::send_json) with the default `POST` method.
    pub async fn post_json<T: Serialize>(&self, payload: &T, url: &str, text_encoding: &str) -> HttpResultData<T> {
        self.send_json(Some(payload), url, text_encoding, DEFAULT_METHOD).await
    }

    /// GETs `url` and decodes a `200` body into `model`.
    ///
    /// Any other status is returned as-is with `model` left empty. A `200`
    /// body that fails to decode turns the whole envelope into a failure.
    pub async fn get_object<T: DeserializeOwned>(&self, url: &str) -> HttpResultData<T> {
        let _guard = self.lock.acquire().await;
        let result = self.fetch(url).await;
        if result.status_code != OK {
            return result;
        }
        match self.codec.deserialize::<T>(&result.response_body) {
            Ok(model) => HttpResultData {
                model: Some(model),
                ..result
            },
            Err(err) => fold_failure("GET", url, err.into()),
        }
    }

    /// GETs `url` and decodes a `200` body into `model_list`.
    ///
    /// Returns `None` for every status other than `200`, transport failures
    /// included. A `200` body that fails to decode still yields a failure
    /// envelope. Callers must handle `None` explicitly; use
    /// [`get_array_envelope`](Self::get_array_envelope) to always get an
    /// envelope back.
    pub async fn get_array<T: DeserializeOwned>(&self, url: &str) -> Option<HttpResultData<T>> {
        let _guard = self.lock.acquire().await;
        let result = self.fetch(url).await;
        if result.status_code != OK {
            return None;
        }
        Some(self.decode_array(url, result))
    }

    /// Like [`get_array`](Self::get_array), but a non-`200` outcome is returned
    /// as an envelope with `model_list` empty instead of `None`.
    pub async fn get_array_envelope<T: DeserializeOwned>(&self, url: &str) -> HttpResultData<T> {
        let _guard = self.lock.acquire().await;
        let result = self.fetch(url).await;
        if result.status_code != OK {
            return result;
        }
        self.decode_array(url, result)
    }

    /// See [`http::join_uri_segments`].
    pub fn join_uri_segments<S: AsRef<str>>(&self, base: &str, segments: &[S]) -> Option<String> {
        http::join_uri_segments(base, segments)
    }

    async fn try_send_json<T: Serialize>(
        &self,
        payload: Option<&T>,
        url: &str,
        text_encoding: &str,
        method: &str,
    ) -> Result<RawResponse, RequestError> {
        let method =
            Method::from_bytes(method.as_bytes()).map_err(|_| RequestError::InvalidMethod(method.to_string()))?;
        let mut request = self.transport.request(method, url);
        if let Some(payload) = payload {
            let text = self.codec.serialize(payload)?;
            let body = http::encode_json_body(&text, text_encoding)?;
            request = request.header(CONTENT_TYPE, body.content_type).body(body.bytes);
        }
        self.execute(request).await
    }

    fn decode_array<T: DeserializeOwned>(&self, url: &str, result: HttpResultData<T>) -> HttpResultData<T> {
        match self.codec.deserialize_array::<T>(&result.response_body) {
            Ok(models) => HttpResultData {
                model_list: Some(models),
                ..result
            },
            Err(err) => fold_failure("GET", url, err.into()),
        }
    }

    async fn fetch<T>(&self, url: &str) -> HttpResultData<T> {
        let request = self.transport.get(url).header(ACCEPT, JSON_CONTENT_TYPE);
        match self.execute(request).await {
            Ok(response) => HttpResultData::from_response(response.status, response.body),
            Err(err) => fold_failure("GET", url, err),
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<RawResponse, RequestError> {
        let request = request.build()?;
        debug!(method = request.method().as_str(), url = request.url().as_str(); "Dispatching request");

        let response = self.transport.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status = status, bytes = body.len(); "Response read");
        Ok(RawResponse { status, body })
    }
}

fn fold_failure<T>(method: &str, url: &str, err: RequestError) -> HttpResultData<T> {
    warn!(method = method, url = url, error:% = err; "Request failed, returning failure envelope");
    HttpResultData::failure(&err)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;
    use crate::error::FailureKind;
    use crate::types::FAILURE_STATUS;

    #[derive(Debug, Serialize, Deserialize)]
    struct Ping {
        seq: u32,
    }

    fn client() -> JsonHttpClient {
        JsonHttpClient::new(Duration::ZERO).unwrap()
    }

    #[test]
    fn new_applies_legacy_coupling() {
        assert!(!client().config().accept_invalid_certs);

        let insecure = JsonHttpClient::new(Duration::from_secs(3)).unwrap();
        assert_eq!(insecure.config().timeout, Some(Duration::from_secs(3)));
        assert!(insecure.config().accept_invalid_certs);
    }

    #[test]
    fn each_client_owns_its_lock_unless_given_one() {
        let a = client();
        let b = client();
        assert!(!a.lock().same_lock(b.lock()));
        assert!(a.lock().same_lock(a.clone().lock()));

        let shared = RequestLock::new();
        let c = JsonHttpClient::with_lock(ClientConfig::default(), shared.clone()).unwrap();
        let d = JsonHttpClient::with_lock(ClientConfig::default(), shared.clone()).unwrap();
        assert!(c.lock().same_lock(d.lock()));
    }

    #[tokio::test]
    async fn invalid_method_is_folded() {
        let result = client()
            .send_json(Some(&Ping { seq: 1 }), "http://127.0.0.1:9/", "utf-8", "GE T")
            .await;
        assert_eq!(result.status_code, FAILURE_STATUS);
        assert_eq!(result.failure, Some(FailureKind::InvalidRequest));
        assert!(result.response_body.contains("GE T"));
    }

    #[tokio::test]
    async fn unknown_encoding_is_folded() {
        let result = client()
            .send_json(Some(&Ping { seq: 1 }), "http://127.0.0.1:9/", "klingon", DEFAULT_METHOD)
            .await;
        assert_eq!(result.status_code, FAILURE_STATUS);
        assert_eq!(result.failure, Some(FailureKind::InvalidRequest));
        assert!(result.model.is_none());
    }

    #[tokio::test]
    async fn unencodable_payload_is_folded() {
        let mut keyed = BTreeMap::new();
        keyed.insert(vec![1u8, 2], "bytes as keys");

        let client = client();
        let result = client
            .send_json(Some(&keyed), "http://127.0.0.1:9/", "utf-8", DEFAULT_METHOD)
            .await;
        assert_eq!(result.status_code, FAILURE_STATUS);
        assert_eq!(result.failure, Some(FailureKind::Serialization));
        assert!(!result.response_body.is_empty());
        assert!(result.model.is_none());
        assert!(!client.lock().is_held());
    }

    #[tokio::test]
    async fn malformed_url_is_folded() {
        let result: HttpResultData<Ping> = client().get_object("not a url").await;
        assert_eq!(result.status_code, FAILURE_STATUS);
        assert_eq!(result.failure, Some(FailureKind::InvalidRequest));
        assert!(!result.response_body.is_empty());
    }

    #[tokio::test]
    async fn lock_is_released_after_failure() {
        let client = client();
        let _ = client.get_object::<Ping>("not a url").await;
        assert!(!client.lock().is_held());
    }

    #[test]
    fn join_delegates_to_helper() {
        assert_eq!(
            client().join_uri_segments("http://h/", &["/a/", "b"]).as_deref(),
            Some("http://h/a/b")
        );
        assert_eq!(client().join_uri_segments(" ", &["a"]), None);
    }
}
