// ── Error taxonomy ──
//
// Every failure that leaves this crate is one of seven kinds. Transport
// failures and non-2xx responses are classified exactly once, where the
// executor first sees them; callers never handle raw `reqwest` errors.
// The kind-to-exit-code table below is the only place exit codes are defined.

use std::time::Duration;

use reqwest::StatusCode;
use strum::{Display, EnumIter};
use thiserror::Error;
use url::Url;

/// Process exit codes consumed by the command-line layer.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const CONNECTIVITY: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 5;
    pub const CONFIGURATION: i32 = 6;
}

/// Top-level error type for the `ignition-api` crate.
#[derive(Debug, Error)]
pub enum Error {
    // ── Local ───────────────────────────────────────────────────────
    /// Missing or invalid local configuration (profile, URL, timeout, arguments).
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// DNS failure, connection refused, TLS handshake failure, dropped connection.
    #[error("Cannot connect to gateway at {url}: {reason}")]
    Connectivity { url: String, reason: String },

    /// The configured timeout elapsed. Never retried at this layer.
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: f64 },

    // ── HTTP ────────────────────────────────────────────────────────
    /// HTTP 401 or 403.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// HTTP 404, or a resource missing at the requested scope.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// HTTP 409 (stale signature, existing references, name collision).
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Every other failure, including unexpected statuses and bad payloads.
    #[error("{message}")]
    General {
        message: String,
        status: Option<u16>,
    },
}

/// Fieldless mirror of [`Error`] for matching and exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ErrorKind {
    #[strum(serialize = "ConfigurationError")]
    Configuration,
    #[strum(serialize = "ConnectivityError")]
    Connectivity,
    #[strum(serialize = "TimeoutError")]
    Timeout,
    #[strum(serialize = "AuthError")]
    Auth,
    #[strum(serialize = "NotFoundError")]
    NotFound,
    #[strum(serialize = "ConflictError")]
    Conflict,
    #[strum(serialize = "GeneralError")]
    General,
}

impl ErrorKind {
    /// The process exit code for this kind of failure.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Connectivity | Self::Timeout => exit_code::CONNECTIVITY,
            Self::Auth => exit_code::AUTH,
            Self::NotFound => exit_code::NOT_FOUND,
            Self::Conflict => exit_code::CONFLICT,
            Self::Configuration => exit_code::CONFIGURATION,
            Self::General => exit_code::GENERAL,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Connectivity { .. } => ErrorKind::Connectivity,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::General { .. } => ErrorKind::General,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// Returns `true` for a 404 or a resource missing at the requested scope.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The HTTP status behind this error, when it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::General { status, .. } => *status,
            _ => None,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn general(message: impl Into<String>) -> Self {
        Self::General {
            message: message.into(),
            status: None,
        }
    }

    /// A local file could not be read or written.
    pub(crate) fn local_io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::general(format!("{}: {err}", path.display()))
    }

    /// A 2xx response whose body did not match the expected shape.
    pub(crate) fn decode(err: &serde_json::Error, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let preview: String = text.chars().take(200).collect();
        Self::general(format!(
            "unexpected response from gateway: {err} (body preview: {preview:?})"
        ))
    }
}

/// Exit code for a finished operation: `0` on success, the kind's code otherwise.
pub fn exit_code<T>(result: &Result<T, Error>) -> i32 {
    match result {
        Ok(_) => exit_code::SUCCESS,
        Err(err) => err.exit_code(),
    }
}

// ── Classification ───────────────────────────────────────────────────

/// A non-2xx response, captured before classification.
#[derive(Debug, Clone)]
pub struct HttpStatusError {
    pub status: StatusCode,
    pub body: String,
    pub url: Url,
}

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

impl HttpStatusError {
    /// The gateway's `message` field if the body is a JSON error, else the raw text.
    pub fn detail(&self) -> String {
        if let Ok(ErrorResponse { message: Some(msg) }) = serde_json::from_str(&self.body) {
            return msg;
        }
        let raw = self.body.trim();
        if raw.is_empty() {
            self.status.to_string()
        } else {
            raw.to_owned()
        }
    }
}

impl From<HttpStatusError> for Error {
    fn from(err: HttpStatusError) -> Self {
        let detail = err.detail();
        match err.status.as_u16() {
            status @ (401 | 403) => {
                let mut message = format!("{detail}. Check your API token");
                if err.url.scheme() == "http" {
                    message.push_str(
                        "; gateways with 'Require secure connections' enabled \
                         reject tokens sent over http://, use https:// instead",
                    );
                }
                Self::Auth { status, message }
            }
            404 => Self::NotFound {
                message: format!("{detail} ({})", err.url.path()),
            },
            409 => Self::Conflict { message: detail },
            status => Self::General {
                message: format!("Gateway returned {status}: {detail}"),
                status: Some(status),
            },
        }
    }
}

/// Classify a transport-level failure.
///
/// `timeout` is the configured limit, reported back in [`Error::Timeout`].
pub fn classify_transport(err: &reqwest::Error, timeout: Option<Duration>) -> Error {
    let url = err
        .url()
        .map_or_else(|| "<unknown>".to_owned(), ToString::to_string);

    if err.is_timeout() {
        Error::Timeout {
            url,
            timeout_secs: timeout.map_or(0.0, |t| t.as_secs_f64()),
        }
    } else if err.is_connect() || err.is_request() || err.is_body() {
        Error::Connectivity {
            url,
            reason: error_chain(err),
        }
    } else if let Some(status) = err.status() {
        Error::General {
            message: format!("Gateway returned {status}: {err}"),
            status: Some(status.as_u16()),
        }
    } else {
        Error::general(format!("HTTP error for {url}: {}", error_chain(err)))
    }
}

/// Render an error with its sources, since `reqwest` hides the useful part
/// (refused, DNS, certificate) a few levels down.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use strum::IntoEnumIterator;

    use super::*;

    fn status_error(status: u16, body: &str, url: &str) -> Error {
        HttpStatusError {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_owned(),
            url: Url::parse(url).unwrap(),
        }
        .into()
    }

    #[test]
    fn exit_codes_cover_every_kind() {
        let expected = [
            (ErrorKind::Configuration, 6),
            (ErrorKind::Connectivity, 2),
            (ErrorKind::Timeout, 2),
            (ErrorKind::Auth, 3),
            (ErrorKind::NotFound, 4),
            (ErrorKind::Conflict, 5),
            (ErrorKind::General, 1),
        ];
        assert_eq!(ErrorKind::iter().count(), expected.len());
        for (kind, code) in expected {
            assert_eq!(kind.exit_code(), code, "{kind}");
        }
    }

    #[test]
    fn statuses_map_to_kinds() {
        let url = "https://gw:8043/data/api/v1/status";
        let table = [
            (401, ErrorKind::Auth, 3),
            (403, ErrorKind::Auth, 3),
            (404, ErrorKind::NotFound, 4),
            (409, ErrorKind::Conflict, 5),
            (422, ErrorKind::General, 1),
            (500, ErrorKind::General, 1),
            (503, ErrorKind::General, 1),
        ];
        for (status, kind, code) in table {
            let err = status_error(status, "", url);
            assert_eq!(err.kind(), kind, "status {status}");
            assert_eq!(err.exit_code(), code, "status {status}");
        }
    }

    #[test]
    fn success_is_exit_zero() {
        let ok: Result<(), Error> = Ok(());
        assert_eq!(exit_code(&ok), 0);
        let err: Result<(), Error> = Err(Error::config("no URL"));
        assert_eq!(exit_code(&err), 6);
    }

    #[test]
    fn detail_prefers_json_message() {
        let err = status_error(
            422,
            r#"{"message":"Name exceeds 255 characters"}"#,
            "https://gw:8043/data/api/v1/resources/ignition/test",
        );
        assert!(err.to_string().contains("Name exceeds 255 characters"));
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn detail_falls_back_to_text_then_status() {
        let err = status_error(500, "Internal Server Error", "https://gw:8043/x");
        assert!(err.to_string().contains("Internal Server Error"));

        let err = status_error(502, "  ", "https://gw:8043/x");
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn auth_error_hints_at_token() {
        let err = status_error(401, r#"{"message":"Unauthorized"}"#, "https://gw:8043/s");
        let text = err.to_string();
        assert!(text.contains("Check your API token"));
        assert!(!text.contains("Require secure connections"));
    }

    #[test]
    fn auth_error_over_http_hints_at_secure_connections() {
        let err = status_error(401, "", "http://gw:8088/data/api/v1/status");
        assert!(err.to_string().contains("Require secure connections"));
    }

    #[tokio::test]
    async fn refused_connection_is_connectivity() {
        // Bind then drop a listener so the port is known to be closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = reqwest::Client::new()
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await
            .unwrap_err();

        let classified = classify_transport(&err, Some(Duration::from_secs(5)));
        assert_eq!(classified.kind(), ErrorKind::Connectivity);
        assert_eq!(classified.exit_code(), 2);
    }
}
