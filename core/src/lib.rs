//! Typed JSON-over-HTTP client core.
//!
//! # Overview
//! Serializes typed payloads to JSON, dispatches them over HTTP(S) and
//! decodes responses back into typed values. Every outcome, success or
//! failure, comes back as an [`HttpResultData`] envelope.
//!
//! # Design
//! - [`JsonCodec`] applies one fixed rule set to all JSON encoding and
//!   decoding, and also converts XML documents to typed values.
//! - [`JsonHttpClient`] runs at most one request/response cycle at a time per
//!   [`RequestLock`]. The lock covers encoding, network I/O and decoding.
//! - Transport and codec failures never escape a client operation; they are
//!   recorded in the envelope with `status_code == -1` and a [`FailureKind`].
//! - Timeout and certificate trust are configured independently through
//!   [`ClientConfig`]; [`JsonHttpClient::new`] keeps the legacy coupling.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use client::JsonHttpClient;
pub use codec::JsonCodec;
pub use config::ClientConfig;
pub use error::{ClientError, CodecError, FailureKind, RequestError};
pub use http::{join_uri_segments, RequestLock, DEFAULT_METHOD};
pub use types::{HttpResultData, FAILURE_STATUS};
