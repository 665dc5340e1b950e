// ── Runtime connection parameters ──
//
// A `ResolvedConnection` describes *where* and *how long*, never *who*:
// credentials travel separately as a `Credential`. It is computed once per
// invocation by the config layer and handed in; this crate never reads
// config files or the environment.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Fixed API root under the gateway base URL.
pub const API_ROOT: [&str; 3] = ["data", "api", "v1"];

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Upper bound accepted for `timeout_seconds`.
pub const MAX_TIMEOUT_SECS: f64 = 600.0;

/// The effective connection after override/env/profile precedence is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConnection {
    /// Gateway base URL without a trailing slash, e.g. `https://gateway:8043`.
    pub base_url: Url,
    /// When `false`, certificate verification is disabled in the transport.
    pub verify_tls: bool,
    /// Request timeout; `0` disables it.
    pub timeout_seconds: f64,
}

impl ResolvedConnection {
    /// Validate and build a connection.
    pub fn new(base_url: &str, verify_tls: bool, timeout_seconds: f64) -> Result<Self, Error> {
        let base_url = parse_base_url(base_url).map_err(Error::config)?;
        validate_timeout(timeout_seconds).map_err(Error::config)?;
        Ok(Self {
            base_url,
            verify_tls,
            timeout_seconds,
        })
    }

    /// The configured timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_seconds > 0.0 {
            Duration::try_from_secs_f64(self.timeout_seconds).ok()
        } else {
            None
        }
    }

    /// URL for a path under the API root. Segments are percent-encoded.
    pub fn api_url(&self, path: &RemotePath) -> Result<Url, Error> {
        self.join_segments(API_ROOT.iter().copied().chain(path.segments()))
    }

    /// URL for a path relative to the gateway origin (outside the API root).
    pub fn origin_url(&self, path: &RemotePath) -> Result<Url, Error> {
        self.join_segments(path.segments())
    }

    fn join_segments<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config(format!("URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Parse a gateway base URL: `http`/`https` only, trailing slashes stripped.
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(format!(
            "gateway URL must start with http:// or https://, got '{raw}'"
        ));
    }
    let url = Url::parse(trimmed).map_err(|e| format!("invalid gateway URL '{raw}': {e}"))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(format!("gateway URL '{raw}' has no host"));
    }
    Ok(url)
}

/// Check a timeout lies in `0..=600` seconds.
pub fn validate_timeout(seconds: f64) -> Result<(), String> {
    if (0.0..=MAX_TIMEOUT_SECS).contains(&seconds) {
        Ok(())
    } else {
        Err(format!(
            "timeout must be between 0 and {MAX_TIMEOUT_SECS} seconds, got {seconds}"
        ))
    }
}

// ── Remote paths ─────────────────────────────────────────────────────

/// A path on the gateway, kept as raw segments until a URL is built.
///
/// Resource and project names may contain spaces or other reserved
/// characters; keeping segments separate lets the URL builder encode each
/// one instead of guessing where the boundaries were.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemotePath(Vec<String>);

impl RemotePath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Split a slash-separated path such as `/status` or `scan/projects`.
    pub fn parse(path: &str) -> Self {
        Self::new(path.split('/').filter(|s| !s.is_empty()))
    }

    /// Append one segment.
    pub fn join(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

impl From<&str> for RemotePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}
