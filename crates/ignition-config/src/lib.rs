//! Gateway profiles and per-invocation connection resolution.
//!
//! TOML profiles, override/environment/profile precedence, and credential
//! selection. Produces the `ResolvedConnection` and `Credential` consumed by
//! `ignition_api::GatewayClient`; never touches the network.

mod credential;
mod profile;
mod resolve;

use thiserror::Error;

pub use credential::{Advisory, AuthResolution, resolve_credential};
pub use profile::{Config, Profile, config_path};
pub use resolve::{
    ENV_PROFILE, ENV_TOKEN, ENV_URL, EnvVars, Overrides, Resolution, resolve, resolve_connection,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error(
        "no gateway URL configured: pass a URL, set IGNITION_GATEWAY_URL, or add a profile"
    )]
    MissingUrl,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Every local configuration failure surfaces as a configuration error
/// (exit code 6).
impl From<ConfigError> for ignition_api::Error {
    fn from(err: ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}
