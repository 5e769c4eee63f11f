//! Error types for the codec and the HTTP client.
//!
//! # Design
//! `CodecError` is what the JSON Codec raises; it is never swallowed inside the
//! codec itself. `RequestError` covers everything that can go wrong during one
//! locked request cycle and is folded into an `HttpResultData` envelope at the
//! operation boundary, so it is only visible to callers through
//! `FailureKind` and the envelope's message text. `ClientError` is the single
//! error a caller can receive directly: the transport could not be built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by `JsonCodec`.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value's structure cannot be represented as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The text is not valid JSON or does not match the target type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The input to the XML conversion path is not well-formed XML.
    #[error("xml parse failed: {0}")]
    Parse(String),
}

impl From<quick_xml::Error> for CodecError {
    fn from(err: quick_xml::Error) -> Self {
        CodecError::Parse(err.to_string())
    }
}

/// Failures inside a single request/response cycle.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Connection, DNS, TLS, timeout or protocol failure.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The method text is not a valid HTTP method token.
    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    /// The text encoding label is not known.
    #[error("unsupported text encoding: {0:?}")]
    UnsupportedEncoding(String),
}

impl RequestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RequestError::Transport(err) if err.is_builder() => FailureKind::InvalidRequest,
            RequestError::Transport(_) => FailureKind::Transport,
            RequestError::Codec(CodecError::Serialization(_)) => FailureKind::Serialization,
            RequestError::Codec(_) => FailureKind::Deserialization,
            RequestError::InvalidMethod(_) | RequestError::UnsupportedEncoding(_) => FailureKind::InvalidRequest,
        }
    }
}

/// Coarse classification of a failed envelope.
///
/// The envelope still carries `status_code == -1` and the message text; this
/// tag lets callers tell a DNS failure from a schema mismatch without parsing
/// that text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The request never produced an HTTP response.
    Transport,

    /// The request could not be built (bad URL, method or encoding).
    InvalidRequest,

    /// The payload could not be encoded as JSON.
    Serialization,

    /// The response body could not be decoded into the target type.
    Deserialization,
}

/// Errors returned when constructing a `JsonHttpClient`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP transport: {0}")]
    Build(#[source] reqwest::Error),
}
