//! OAuth client primitives: grant styles, tokens, normalized profiles and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::http_client::HttpClientError;

/// Which OAuth variant governs the exchange algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantStyle {
    /// OAuth 2.0 authorization code grant.
    AuthorizationCode,
    /// OAuth 1.0a requests authenticated by an HMAC-SHA1 signature header.
    SignedRequest,
}

/// Access token retained by the caller once a session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Token value sent to the resource server.
    pub token: String,
    /// Token secret, only present for signed-request providers.
    pub secret: Option<String>,
    /// Account identifier returned alongside the token, if any.
    pub account_id: Option<String>,
}

impl AccessToken {
    /// Creates a bearer-style token with no secret.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self { token: token.into(), secret: None, account_id: None }
    }

    /// Creates a signed-request token with its secret.
    pub fn signed(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { token: token.into(), secret: Some(secret.into()), account_id: None }
    }

    /// Attaches the account identifier reported by the provider.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

/// Provider-agnostic user profile.
///
/// Every field is a plain string; anything the provider omits is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
}

/// One entry of a provider's email listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    #[serde(rename = "email")]
    pub address: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub visibility: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Errors surfaced by every client operation.
///
/// Each variant names the operation that failed so callers can diagnose
/// without consulting logs.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// A required field was empty or the session is in the wrong phase.
    #[error("{operation}: {field} undefined, it must be set before this call")]
    Configuration {
        operation: &'static str,
        field: &'static str,
    },
    /// Transport failure: refused connection, timeout, unreadable body.
    #[error("{operation}: network failure: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: HttpClientError,
    },
    /// A response arrived but was undecodable or lacked a required field.
    #[error("{operation}: protocol error: {reason}")]
    Protocol {
        operation: &'static str,
        reason: String,
    },
    /// A well-formed but empty result set.
    #[error("{operation}: {what} not found")]
    NotFound {
        operation: &'static str,
        what: &'static str,
    },
}

impl OAuthError {
    pub(crate) fn configuration(operation: &'static str, field: &'static str) -> Self {
        OAuthError::Configuration { operation, field }
    }

    pub(crate) fn network(operation: &'static str, source: HttpClientError) -> Self {
        OAuthError::Network { operation, source }
    }

    pub(crate) fn protocol(operation: &'static str, reason: impl Into<String>) -> Self {
        OAuthError::Protocol { operation, reason: reason.into() }
    }

    pub(crate) fn not_found(operation: &'static str, what: &'static str) -> Self {
        OAuthError::NotFound { operation, what }
    }

    /// Short machine-readable kind, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OAuthError::Configuration { .. } => "configuration",
            OAuthError::Network { .. } => "network",
            OAuthError::Protocol { .. } => "protocol",
            OAuthError::NotFound { .. } => "not_found",
        }
    }

    /// The operation that produced this error.
    pub fn operation(&self) -> &'static str {
        match self {
            OAuthError::Configuration { operation, .. }
            | OAuthError::Network { operation, .. }
            | OAuthError::Protocol { operation, .. }
            | OAuthError::NotFound { operation, .. } => operation,
        }
    }
}

/// Fails with a configuration error when `value` is empty.
pub(crate) fn require(operation: &'static str, field: &'static str, value: &str) -> Result<(), OAuthError> {
    if value.is_empty() {
        Err(OAuthError::configuration(operation, field))
    } else {
        Ok(())
    }
}
