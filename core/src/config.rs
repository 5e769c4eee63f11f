//! Transport configuration.
//!
//! # Design
//! Timeout and certificate trust are separate knobs. The legacy constructor
//! coupling, where any nonzero timeout also disables certificate validation,
//! is kept only behind [`ClientConfig::from_timeout`] so that insecure mode is
//! always something a caller asked for by name.

use std::time::Duration;

use log::warn;

/// Environment variable holding the request timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "COURIER_TIMEOUT_MS";

/// Environment variable that disables certificate validation when `true`/`1`.
pub const ACCEPT_INVALID_CERTS_ENV: &str = "COURIER_ACCEPT_INVALID_CERTS";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Whole-request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
    /// Trust any server certificate. Never on by default.
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    /// Legacy coupling: zero means default transport with strict TLS; any
    /// other value sets that timeout and trusts every server certificate.
    pub fn from_timeout(timeout: Duration) -> Self {
        if timeout.is_zero() {
            return Self::default();
        }
        Self {
            timeout: Some(timeout),
            accept_invalid_certs: true,
        }
    }

    /// Reads [`TIMEOUT_ENV`] and [`ACCEPT_INVALID_CERTS_ENV`]. Missing or
    /// unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout = lookup(TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        let accept_invalid_certs = lookup(ACCEPT_INVALID_CERTS_ENV)
            .map(|v| {
                let val = v.trim().to_lowercase();
                val == "true" || val == "1"
            })
            .unwrap_or(false);
        Self {
            timeout,
            accept_invalid_certs,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Opt in to trusting every server certificate.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub(crate) fn build_transport(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if self.accept_invalid_certs {
            warn!("Server certificate validation is disabled for this client");
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build()
    }
}
