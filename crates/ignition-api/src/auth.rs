use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Header carrying an Ignition API token (`keyId:secretKey`).
pub const TOKEN_HEADER: &str = "X-Ignition-API-Token";

/// Which authentication strategy a credential uses.
///
/// Marker enum (no data) -- the secret material lives in [`Credential`].
/// Useful for logging and advisories without touching secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum AuthStrategy {
    Token,
    Basic,
    None,
}

/// Credentials for authenticating with a gateway.
///
/// Exactly one strategy is ever active; a profile with both a token and
/// basic credentials resolves to [`Credential::Token`].
#[derive(Debug, Clone)]
pub enum Credential {
    /// API token, sent as the [`TOKEN_HEADER`] header. `secret` is `None`
    /// when the raw token had no `:`.
    Token {
        key_id: String,
        secret: Option<SecretString>,
    },

    /// HTTP basic auth. 8.3 gateways reject this for REST calls.
    Basic {
        username: String,
        password: SecretString,
    },

    /// No authentication.
    None,
}

impl Credential {
    /// Split a `keyId:secretKey` token at the first `:`.
    ///
    /// A token without a `:` is kept whole as the key id. Either way the
    /// header carries the raw token unchanged.
    pub fn token(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((key_id, secret)) => Self::Token {
                key_id: key_id.to_owned(),
                secret: Some(SecretString::from(secret.to_owned())),
            },
            None => Self::Token {
                key_id: raw.to_owned(),
                secret: None,
            },
        }
    }

    pub fn basic(username: impl Into<String>, password: SecretString) -> Self {
        Self::Basic {
            username: username.into(),
            password,
        }
    }

    pub fn strategy(&self) -> AuthStrategy {
        match self {
            Self::Token { .. } => AuthStrategy::Token,
            Self::Basic { .. } => AuthStrategy::Basic,
            Self::None => AuthStrategy::None,
        }
    }

    /// Attach this credential to an outgoing request.
    pub(crate) fn apply(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, Error> {
        match self {
            Self::Token { key_id, secret } => {
                let raw = match secret {
                    Some(secret) => format!("{key_id}:{}", secret.expose_secret()),
                    None => key_id.clone(),
                };
                let mut value = HeaderValue::from_str(&raw).map_err(|e| Error::Configuration {
                    message: format!("invalid API token header value: {e}"),
                })?;
                value.set_sensitive(true);
                Ok(builder.header(TOKEN_HEADER, value))
            }
            Self::Basic { username, password } => {
                Ok(builder.basic_auth(username, Some(password.expose_secret())))
            }
            Self::None => Ok(builder),
        }
    }
}
