// Shared transport configuration for building reqwest::Client instances.
//
// TLS and timeout settings come from the resolved connection. The total
// request timeout is applied per request by the executor so that streaming
// transfers can run past it; the client itself only bounds connection setup
// and individual reads.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::connection::ResolvedConnection;
use crate::error::Error;

const USER_AGENT: &str = concat!("ignition-api/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// `false` disables certificate verification and nothing else.
    pub verify_tls: bool,
    /// `None` disables timeouts.
    pub timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl TransportConfig {
    pub fn from_connection(connection: &ResolvedConnection) -> Self {
        Self {
            verify_tls: connection.verify_tls,
            timeout: connection.timeout(),
        }
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// No retry layer: every request is sent exactly once.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if let Some(timeout) = self.timeout {
            builder = builder.connect_timeout(timeout).read_timeout(timeout);
        }

        if !self.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(|e| Error::Configuration {
            message: format!("failed to build HTTP client: {e}"),
        })
    }
}
