//! Ready-made configurations for the providers this crate was built against.
//!
//! Credentials are always supplied by the caller; nothing is compiled in.

use crate::oauth_core::config::{ProfileEndpoint, ProfileShape, ProviderConfig, TokenPlacement};
use crate::oauth_core::http_client::HttpMethod;
use crate::oauth_core::types::GrantStyle;

pub fn github(
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
    redirect_path: impl Into<String>,
) -> ProviderConfig {
    ProviderConfig::new(
        GrantStyle::AuthorizationCode,
        client_id,
        client_secret,
        "https://github.com/login/oauth/authorize",
        "https://github.com/login/oauth/access_token",
        "https://api.github.com",
        redirect_path,
    )
    .with_scopes(["user"])
    .with_profile(ProfileEndpoint {
        path: "/user".to_string(),
        method: HttpMethod::GET,
        token_placement: TokenPlacement::BearerHeader,
        shape: ProfileShape::GitHub,
    })
    .with_emails_path("/user/emails")
}

/// Dropbox reports the account through `POST /users/get_current_account`.
pub fn dropbox(
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
    redirect_path: impl Into<String>,
) -> ProviderConfig {
    ProviderConfig::new(
        GrantStyle::AuthorizationCode,
        client_id,
        client_secret,
        "https://www.dropbox.com/oauth2/authorize",
        "https://api.dropboxapi.com/oauth2/token",
        "https://api.dropboxapi.com/2",
        redirect_path,
    )
    .with_response_type("code")
    .with_profile(ProfileEndpoint {
        path: "/users/get_current_account".to_string(),
        method: HttpMethod::POST,
        token_placement: TokenPlacement::BearerHeader,
        shape: ProfileShape::Dropbox,
    })
}

pub fn facebook(
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
    redirect_path: impl Into<String>,
) -> ProviderConfig {
    ProviderConfig::new(
        GrantStyle::AuthorizationCode,
        client_id,
        client_secret,
        "https://www.facebook.com/v2.12/dialog/oauth",
        "https://graph.facebook.com/v2.12/oauth/access_token",
        "https://graph.facebook.com/v2.12",
        redirect_path,
    )
    .with_scopes(["email", "public_profile"])
    .with_profile(ProfileEndpoint {
        path: "/me?fields=id,name,email,picture".to_string(),
        method: HttpMethod::GET,
        token_placement: TokenPlacement::QueryParameter,
        shape: ProfileShape::Facebook,
    })
}

/// Twitter signs every call with OAuth 1.0a. Pass the application's own
/// access token with [`ProviderConfig::with_app_token`] if the app requires it.
pub fn twitter(
    consumer_key: impl Into<String>,
    consumer_secret: impl Into<String>,
    redirect_path: impl Into<String>,
) -> ProviderConfig {
    ProviderConfig::new(
        GrantStyle::SignedRequest,
        consumer_key,
        consumer_secret,
        "https://api.twitter.com/oauth/authorize",
        "https://api.twitter.com/oauth/access_token",
        "https://api.twitter.com/1.1",
        redirect_path,
    )
    .with_request_token_endpoint("https://api.twitter.com/oauth/request_token")
    .with_profile(ProfileEndpoint {
        path: "/account/verify_credentials.json?include_email=true".to_string(),
        method: HttpMethod::GET,
        token_placement: TokenPlacement::SignedHeader,
        shape: ProfileShape::Twitter,
    })
}
