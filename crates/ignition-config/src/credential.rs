// Credential selection: `Profile -> Credential`, plus advisories the caller
// may want to render as warnings.

use std::fmt;

use secrecy::SecretString;
use tracing::warn;

use ignition_api::Credential;

use crate::Profile;

/// A non-fatal condition worth telling the user about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// Certificate verification is off for this connection.
    TlsVerificationDisabled,
    /// Basic credentials were selected; 8.3+ gateways only accept API tokens.
    BasicAuthUnsupported,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TlsVerificationDisabled => {
                "TLS certificate verification is disabled for this gateway"
            }
            Self::BasicAuthUnsupported => {
                "basic authentication is not supported by Ignition 8.3+ gateways; configure an API token"
            }
        })
    }
}

/// The selected credential and any advisories raised while selecting it.
#[derive(Debug, Clone)]
pub struct AuthResolution {
    pub credential: Credential,
    pub advisories: Vec<Advisory>,
}

/// Select the credential for a profile.
///
/// A token always wins; otherwise basic auth when both username and password
/// are present; otherwise no authentication. Empty strings count as absent.
pub fn resolve_credential(profile: &Profile) -> AuthResolution {
    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);

    let credential = match (
        present(&profile.token),
        present(&profile.username),
        present(&profile.password),
    ) {
        (Some(token), _, _) => Credential::token(&token),
        (None, Some(username), Some(password)) => {
            Credential::basic(username, SecretString::from(password))
        }
        _ => Credential::None,
    };

    let mut advisories = Vec::new();
    if !profile.verify_tls {
        advisories.push(Advisory::TlsVerificationDisabled);
    }
    if matches!(credential, Credential::Basic { .. }) {
        advisories.push(Advisory::BasicAuthUnsupported);
    }
    for advisory in &advisories {
        warn!(url = %profile.base_url, "{advisory}");
    }

    AuthResolution {
        credential,
        advisories,
    }
}
