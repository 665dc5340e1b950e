use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ignition_api::connection::{DEFAULT_TIMEOUT_SECS, parse_base_url, validate_timeout};

use crate::ConfigError;

// ── Profile ─────────────────────────────────────────────────────────

/// A named gateway profile.
///
/// Secrets are stored as plaintext in the config file, which is written
/// owner-only; the `Debug` output redacts them.
#[derive(Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Gateway base URL (e.g., "https://gateway:8043").
    #[serde(rename = "url")]
    pub base_url: String,

    /// API token, `keyId:secretKey`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(rename = "verify_ssl", default = "default_verify")]
    pub verify_tls: bool,

    /// Seconds; `0` disables the timeout.
    #[serde(rename = "timeout", default = "default_timeout")]
    pub timeout_seconds: f64,
}

fn default_verify() -> bool {
    true
}
fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

impl Profile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            username: None,
            password: None,
            verify_tls: true,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn timeout_seconds(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Check the URL scheme and the timeout range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base_url(&self.base_url).map_err(|reason| ConfigError::Validation {
            field: "url".into(),
            reason,
        })?;
        validate_timeout(self.timeout_seconds).map_err(|reason| ConfigError::Validation {
            field: "timeout".into(),
            reason,
        })
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Profile")
            .field("base_url", &self.base_url)
            .field("token", &redact(&self.token))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("verify_tls", &self.verify_tls)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

// ── Config file ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Named gateway profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sflow", "ignition-cli").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("ignition-cli");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

impl Config {
    /// Load from `path`. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()?;
        debug!(path = %path.display(), profiles = config.profiles.len(), "loaded config");
        Ok(config)
    }

    /// Load from the platform config path.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&config_path())
    }

    /// Write as TOML, readable by the owner only.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Add or replace a profile. The first profile becomes the default.
    pub fn add_profile(&mut self, name: impl Into<String>, profile: Profile) -> Result<(), ConfigError> {
        profile.validate()?;
        let name = name.into();
        if self.default_profile.is_none() {
            self.default_profile = Some(name.clone());
        }
        self.profiles.insert(name, profile);
        Ok(())
    }

    /// Remove a profile. If it was the default, the default moves to the
    /// first remaining profile (by name), or is cleared.
    pub fn remove_profile(&mut self, name: &str) -> Result<Profile, ConfigError> {
        let removed = self
            .profiles
            .remove(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })?;
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = self.profiles.keys().next().cloned();
        }
        Ok(removed)
    }

    pub fn set_default(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.profiles.contains_key(name) {
            return Err(ConfigError::ProfileNotFound { name: name.into() });
        }
        self.default_profile = Some(name.to_owned());
        Ok(())
    }

    /// Look up a profile by name, or the default profile when `name` is `None`.
    ///
    /// A named profile that does not exist is an error; a missing default is
    /// `Ok(None)`.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(&str, &Profile)>, ConfigError> {
        match name {
            Some(name) => self
                .profiles
                .get_key_value(name)
                .map(|(k, p)| Some((k.as_str(), p)))
                .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() }),
            None => Ok(self
                .default_profile
                .as_deref()
                .and_then(|name| self.profiles.get_key_value(name))
                .map(|(k, p)| (k.as_str(), p))),
        }
    }
}
