//! The uniform result envelope returned by every network operation.
//!
//! # Design
//! An envelope is built fresh for each call and handed to the caller, who then
//! owns it outright. Failures are carried as data: `status_code` is set to
//! [`FAILURE_STATUS`], `response_body` holds the failure message, and
//! `failure` classifies it. Exactly one of `model` / `model_list` is populated
//! on success, depending on the operation; both stay `None` on failure.

use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, RequestError};

/// Status code recorded when no usable HTTP response was obtained.
pub const FAILURE_STATUS: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResultData<T> {
    /// HTTP status, or [`FAILURE_STATUS`] on a transport or processing failure.
    pub status_code: i32,
    /// Raw response text, or the failure message.
    pub response_body: String,
    /// Set by `get_object` when the body decodes as a single `T`.
    pub model: Option<T>,
    /// Set by the array GET operations when the body decodes as `[T]`.
    pub model_list: Option<Vec<T>>,
    pub failure: Option<FailureKind>,
}

impl<T> Default for HttpResultData<T> {
    fn default() -> Self {
        Self {
            status_code: 0,
            response_body: String::new(),
            model: None,
            model_list: None,
            failure: None,
        }
    }
}

impl<T> HttpResultData<T> {
    /// An envelope for a response that arrived, before any decoding.
    pub fn from_response(status_code: u16, response_body: String) -> Self {
        Self {
            status_code: i32::from(status_code),
            response_body,
            ..Self::default()
        }
    }

    pub fn failure(err: &RequestError) -> Self {
        Self {
            status_code: FAILURE_STATUS,
            response_body: err.to_string(),
            failure: Some(err.kind()),
            ..Self::default()
        }
    }

    /// True for a 2xx status with no recorded failure.
    pub fn is_success(&self) -> bool {
        self.failure.is_none() && (200..300).contains(&self.status_code)
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
