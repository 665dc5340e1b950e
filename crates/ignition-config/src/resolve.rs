// ── Connection resolution ──
//
// Each field is resolved independently, highest first:
//
//   explicit override > environment variable > profile field > built-in default
//
// Only `verify_tls` and `timeout_seconds` have built-in defaults. There is no
// default URL. Empty strings count as unset at every level. A requested
// profile that is not stored contributes nothing; only a missing URL fails.

use tracing::{debug, warn};

use ignition_api::connection::{DEFAULT_TIMEOUT_SECS, ResolvedConnection};
use ignition_api::{Credential, GatewayClient};

use crate::credential::{Advisory, AuthResolution, resolve_credential};
use crate::{Config, ConfigError, Profile};

pub const ENV_URL: &str = "IGNITION_GATEWAY_URL";
pub const ENV_TOKEN: &str = "IGNITION_API_TOKEN";
pub const ENV_PROFILE: &str = "IGNITION_GATEWAY_PROFILE";

/// Values passed explicitly by the caller (usually command-line flags).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub url: Option<String>,
    pub token: Option<String>,
    pub verify_tls: Option<bool>,
    pub timeout_seconds: Option<f64>,
}

/// Snapshot of the gateway environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    pub url: Option<String>,
    pub token: Option<String>,
    pub profile: Option<String>,
}

impl EnvVars {
    /// Read the process environment once. Empty values count as unset.
    pub fn capture() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            url: read(ENV_URL),
            token: read(ENV_TOKEN),
            profile: read(ENV_PROFILE),
        }
    }
}

/// The outcome of resolution for one invocation.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub connection: ResolvedConnection,
    /// The effective profile: stored fields with overrides applied.
    pub profile: Profile,
    /// The stored profile used, if any.
    pub profile_name: Option<String>,
}

impl Resolution {
    pub fn credential(&self) -> AuthResolution {
        resolve_credential(&self.profile)
    }

    /// Build a client for this connection, returning any auth advisories.
    pub fn into_client(self) -> Result<(GatewayClient, Vec<Advisory>), ignition_api::Error> {
        let AuthResolution {
            credential,
            advisories,
        } = self.credential();
        let client = GatewayClient::new(self.connection, credential)?;
        Ok((client, advisories))
    }
}

/// Merge overrides, environment and stored profiles into one connection.
pub fn resolve_connection(
    config: &Config,
    overrides: &Overrides,
    env: &EnvVars,
) -> Result<Resolution, ConfigError> {
    let requested =
        non_empty(overrides.profile.as_ref()).or_else(|| non_empty(env.profile.as_ref()));
    let stored = match config.profile(requested.as_deref()) {
        Ok(stored) => stored,
        Err(ConfigError::ProfileNotFound { name }) => {
            warn!(profile = %name, "profile not found, resolving without it");
            None
        }
        Err(e) => return Err(e),
    };
    let (profile_name, stored) = match stored {
        Some((name, profile)) => (Some(name.to_owned()), Some(profile)),
        None => (None, None),
    };

    let base_url = non_empty(overrides.url.as_ref())
        .or_else(|| non_empty(env.url.as_ref()))
        .or_else(|| stored.map(|p| p.base_url.clone()))
        .ok_or(ConfigError::MissingUrl)?;

    let profile = Profile {
        base_url: base_url.trim().trim_end_matches('/').to_owned(),
        token: non_empty(overrides.token.as_ref())
            .or_else(|| non_empty(env.token.as_ref()))
            .or_else(|| stored.and_then(|p| p.token.clone())),
        username: stored.and_then(|p| p.username.clone()),
        password: stored.and_then(|p| p.password.clone()),
        verify_tls: overrides
            .verify_tls
            .or_else(|| stored.map(|p| p.verify_tls))
            .unwrap_or(true),
        timeout_seconds: overrides
            .timeout_seconds
            .or_else(|| stored.map(|p| p.timeout_seconds))
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    };
    profile.validate()?;

    let connection = ResolvedConnection::new(&profile.base_url, profile.verify_tls, profile.timeout_seconds)
        .map_err(|e| ConfigError::Validation {
            field: "connection".into(),
            reason: e.to_string(),
        })?;
    debug!(
        url = %connection.base_url,
        profile = ?profile_name,
        verify_tls = connection.verify_tls,
        timeout = connection.timeout_seconds,
        "resolved gateway connection"
    );

    Ok(Resolution {
        connection,
        profile,
        profile_name,
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Resolve the connection and credential in one step.
pub fn resolve(
    config: &Config,
    overrides: &Overrides,
    env: &EnvVars,
) -> Result<(ResolvedConnection, Credential, Vec<Advisory>), ConfigError> {
    let resolution = resolve_connection(config, overrides, env)?;
    let AuthResolution {
        credential,
        advisories,
    } = resolution.credential();
    Ok((resolution.connection, credential, advisories))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use ignition_api::AuthStrategy;
    use pretty_assertions::assert_eq;

    use super::*;

    fn config_with(profiles: &[(&str, Profile)]) -> Config {
        let mut config = Config::default();
        for (name, profile) in profiles {
            config.add_profile(*name, profile.clone()).unwrap();
        }
        config
    }

    #[test]
    fn default_profile_with_token() {
        let config = config_with(&[("prod", Profile::new("https://g:8043").token("k:s"))]);

        let resolution =
            resolve_connection(&config, &Overrides::default(), &EnvVars::default()).unwrap();

        assert_eq!(resolution.connection.base_url.as_str(), "https://g:8043/");
        assert_eq!(
            resolution.connection.api_url(&"status".into()).unwrap().as_str(),
            "https://g:8043/data/api/v1/status"
        );
        assert_eq!(resolution.credential().credential.strategy(), AuthStrategy::Token);
        assert_eq!(resolution.profile_name.as_deref(), Some("prod"));
    }

    #[test]
    fn override_beats_env_beats_profile() {
        let config = config_with(&[(
            "prod",
            Profile::new("https://profile").token("p:p").timeout_seconds(10.0),
        )]);
        let env = EnvVars {
            url: Some("https://env".into()),
            token: Some("e:e".into()),
            profile: None,
        };

        let from_env = resolve_connection(&config, &Overrides::default(), &env).unwrap();
        assert_eq!(from_env.profile.base_url, "https://env");
        assert_eq!(from_env.profile.token.as_deref(), Some("e:e"));
        assert_eq!(from_env.connection.timeout_seconds, 10.0);

        let overrides = Overrides {
            url: Some("https://flag/".into()),
            token: Some("f:f".into()),
            timeout_seconds: Some(0.0),
            verify_tls: Some(false),
            ..Overrides::default()
        };
        let from_flags = resolve_connection(&config, &overrides, &env).unwrap();
        assert_eq!(from_flags.profile.base_url, "https://flag");
        assert_eq!(from_flags.profile.token.as_deref(), Some("f:f"));
        assert_eq!(from_flags.connection.timeout(), None);
        assert!(!from_flags.connection.verify_tls);
    }

    #[test]
    fn fields_resolve_independently() {
        let config = config_with(&[("prod", Profile::new("https://profile").token("p:p"))]);
        let env = EnvVars {
            url: Some("https://env".into()),
            ..EnvVars::default()
        };

        let resolution = resolve_connection(&config, &Overrides::default(), &env).unwrap();
        assert_eq!(resolution.profile.base_url, "https://env");
        assert_eq!(resolution.profile.token.as_deref(), Some("p:p"));
    }

    #[test]
    fn env_profile_selects_stored_profile() {
        let config = config_with(&[
            ("prod", Profile::new("https://prod")),
            ("lab", Profile::new("http://lab:8088").basic("admin", "pw")),
        ]);
        let env = EnvVars {
            profile: Some("lab".into()),
            ..EnvVars::default()
        };

        let resolution = resolve_connection(&config, &Overrides::default(), &env).unwrap();
        assert_eq!(resolution.profile.base_url, "http://lab:8088");
        assert_eq!(resolution.credential().credential.strategy(), AuthStrategy::Basic);
    }

    #[test]
    fn missing_requested_profile_falls_through_to_env() {
        let config = config_with(&[("prod", Profile::new("https://prod").token("p:p"))]);
        let env = EnvVars {
            profile: Some("staging".into()),
            url: Some("https://env:8043".into()),
            token: Some("k:s".into()),
        };

        let resolution = resolve_connection(&config, &Overrides::default(), &env).unwrap();
        assert_eq!(resolution.profile.base_url, "https://env:8043");
        assert_eq!(resolution.profile.token.as_deref(), Some("k:s"));
        assert_eq!(resolution.profile_name, None);
        assert_eq!(resolution.connection.timeout_seconds, 30.0);
    }

    #[test]
    fn missing_requested_profile_without_url_is_missing_url() {
        let config = config_with(&[("prod", Profile::new("https://prod"))]);
        let overrides = Overrides {
            profile: Some("staging".into()),
            ..Overrides::default()
        };

        let err = resolve_connection(&config, &overrides, &EnvVars::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl));
    }

    #[test]
    fn empty_overrides_fall_through() {
        let config = config_with(&[("prod", Profile::new("https://profile").token("p:p"))]);
        let env = EnvVars {
            url: Some("https://env".into()),
            ..EnvVars::default()
        };
        let overrides = Overrides {
            profile: Some(String::new()),
            url: Some(String::new()),
            token: Some("  ".into()),
            ..Overrides::default()
        };

        let resolution = resolve_connection(&config, &overrides, &env).unwrap();
        assert_eq!(resolution.profile.base_url, "https://env");
        assert_eq!(resolution.profile.token.as_deref(), Some("p:p"));
        assert_eq!(resolution.profile_name.as_deref(), Some("prod"));
    }

    #[test]
    fn no_url_anywhere_is_an_error() {
        let err =
            resolve_connection(&Config::default(), &Overrides::default(), &EnvVars::default())
                .unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl));
    }

    #[test]
    fn url_only_from_env_uses_defaults() {
        let env = EnvVars {
            url: Some("https://env:8043".into()),
            token: Some("k:s".into()),
            profile: None,
        };

        let (connection, credential, advisories) =
            resolve(&Config::default(), &Overrides::default(), &env).unwrap();
        assert!(connection.verify_tls);
        assert_eq!(connection.timeout_seconds, 30.0);
        assert_eq!(credential.strategy(), AuthStrategy::Token);
        assert!(advisories.is_empty());
    }

    #[test]
    fn invalid_override_values_are_rejected() {
        let env = EnvVars {
            url: Some("https://env".into()),
            ..EnvVars::default()
        };
        let bad_timeout = Overrides {
            timeout_seconds: Some(900.0),
            ..Overrides::default()
        };
        assert!(matches!(
            resolve_connection(&Config::default(), &bad_timeout, &env),
            Err(ConfigError::Validation { .. })
        ));

        let bad_url = Overrides {
            url: Some("ftp://gw".into()),
            ..Overrides::default()
        };
        assert!(resolve_connection(&Config::default(), &bad_url, &env).is_err());
    }
}
