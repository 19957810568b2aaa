//! Provider and transport configuration.

use std::fmt;
use std::time::Duration;

use super::http_client::{HttpMethod, RedirectPolicy};
use super::types::GrantStyle;

/// How the access token travels with resource requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPlacement {
    /// `?access_token=...` appended to the URL.
    QueryParameter,
    /// `Authorization: Bearer ...`.
    BearerHeader,
    /// OAuth1 `Authorization: OAuth ...` signed with the token secret.
    SignedHeader,
}

/// Body encoding of the code-for-token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRequestEncoding {
    Form,
    Json,
}

/// Tag selecting the decoder that normalizes a provider's user payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileShape {
    GitHub,
    Dropbox,
    Facebook,
    Twitter,
}

/// Where and how to fetch the user profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEndpoint {
    /// Path appended to the resource base URI; may carry its own query.
    pub path: String,
    pub method: HttpMethod,
    pub token_placement: TokenPlacement,
    pub shape: ProfileShape,
}

/// Application-level token pair used to sign request-token calls.
#[derive(Clone, PartialEq, Eq)]
pub struct AppToken {
    pub token: String,
    pub secret: String,
}

impl fmt::Debug for AppToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppToken").field("token", &self.token).finish_non_exhaustive()
    }
}

/// Immutable endpoint and credential configuration of one provider.
///
/// `Debug` output leaves out the client secret.
#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub resource_base_uri: String,
    /// Callback URI registered with the provider.
    pub redirect_path: String,
    pub grant_style: GrantStyle,
    pub scopes: Vec<String>,
    pub response_type: Option<String>,
    pub token_request_encoding: TokenRequestEncoding,
    pub profile: ProfileEndpoint,
    pub emails_path: Option<String>,
    /// Temporary-token endpoint, signed-request style only.
    pub request_token_endpoint: Option<String>,
    pub app_token: Option<AppToken>,
}

impl ProviderConfig {
    /// Creates a configuration with the mandatory endpoints.
    ///
    /// The profile endpoint defaults to `GET {resource_base_uri}/user` with a
    /// bearer header, decoded as a GitHub-shaped payload.
    pub fn new(
        grant_style: GrantStyle,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        resource_base_uri: impl Into<String>,
        redirect_path: impl Into<String>,
    ) -> Self {
        let token_placement = match grant_style {
            GrantStyle::AuthorizationCode => TokenPlacement::BearerHeader,
            GrantStyle::SignedRequest => TokenPlacement::SignedHeader,
        };
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            resource_base_uri: resource_base_uri.into(),
            redirect_path: redirect_path.into(),
            grant_style,
            scopes: Vec::new(),
            response_type: None,
            token_request_encoding: TokenRequestEncoding::Form,
            profile: ProfileEndpoint {
                path: "/user".to_string(),
                method: HttpMethod::GET,
                token_placement,
                shape: ProfileShape::GitHub,
            },
            emails_path: None,
            request_token_endpoint: None,
            app_token: None,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    pub fn with_token_request_encoding(mut self, encoding: TokenRequestEncoding) -> Self {
        self.token_request_encoding = encoding;
        self
    }

    pub fn with_profile(mut self, profile: ProfileEndpoint) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_emails_path(mut self, path: impl Into<String>) -> Self {
        self.emails_path = Some(path.into());
        self
    }

    pub fn with_request_token_endpoint(mut self, url: impl Into<String>) -> Self {
        self.request_token_endpoint = Some(url.into());
        self
    }

    pub fn with_app_token(mut self, token: impl Into<String>, secret: impl Into<String>) -> Self {
        self.app_token = Some(AppToken { token: token.into(), secret: secret.into() });
        self
    }

    /// Joins the resource base URI and a path without doubling the slash.
    pub fn resource_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.resource_base_uri.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("resource_base_uri", &self.resource_base_uri)
            .field("redirect_path", &self.redirect_path)
            .field("grant_style", &self.grant_style)
            .field("scopes", &self.scopes)
            .field("profile", &self.profile)
            .field("app_token", &self.app_token)
            .finish_non_exhaustive()
    }
}

/// Transport behaviour shared by every call a client makes.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Upper bound on each network call; expiry surfaces as a network error.
    pub timeout: Duration,
    /// Largest response body the transport will accept.
    pub max_body_size: usize,
    pub redirect_policy: RedirectPolicy,
}

impl ClientSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn with_redirect_policy(mut self, policy: RedirectPolicy) -> Self {
        self.redirect_policy = policy;
        self
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
            redirect_policy: RedirectPolicy::None,
        }
    }
}
