use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::config::{ClientSettings, ProviderConfig, TokenPlacement, TokenRequestEncoding};
use super::crypto::{Clock, NonceSource, SystemClock, SystemNonce};
use super::http_client::{HttpClientError, HttpMethod, HttpRequest, HttpResponse, OAuthHttpClient};
use super::profile::{id_string, normalize_profile};
use super::session::{AuthorizationSession, RequestToken};
use super::signed_request::{authorization_header, sign, OAuth1Params};
use super::types::{require, AccessToken, EmailRecord, GrantStyle, OAuthError, ProfileData};
use super::url_encoding::{encode_pairs, encode_url_owned};
use crate::media::{decode, Validate, ValidationError};

const BUILD_URL: &str = "build_authorization_url";
const EXCHANGE: &str = "exchange_code_for_token";
const FETCH_PROFILE: &str = "fetch_profile";
const FETCH_EMAILS: &str = "fetch_verified_emails";

/// Token endpoint payload of the authorization-code grant, JSON or form-encoded.
#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: Option<String>,
    // Some providers send numeric ids.
    #[serde(default)]
    account_id: Value,
    #[serde(default)]
    uid: Value,
    error: Option<String>,
    error_description: Option<String>,
}

impl Validate for TokenPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.access_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(ValidationError::missing_attribute("response", "access_token")),
        }
    }
}

/// `oauth_token` / `oauth_token_secret` pair returned by both signed-request steps.
#[derive(Debug, Deserialize)]
struct SignedTokenPayload {
    oauth_token: Option<String>,
    oauth_token_secret: Option<String>,
    oauth_callback_confirmed: Option<String>,
    #[serde(default)]
    user_id: Value,
}

impl Validate for SignedTokenPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut err = None;
        if self.oauth_token.as_deref().unwrap_or_default().is_empty() {
            err = ValidationError::merge(err, ValidationError::missing_attribute("response", "oauth_token"));
        }
        if self.oauth_token_secret.as_deref().unwrap_or_default().is_empty() {
            err = ValidationError::merge(err, ValidationError::missing_attribute("response", "oauth_token_secret"));
        }
        match err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn log_failure(err: &OAuthError) {
    warn!(operation = err.operation(), error_kind = err.kind(), error = %err, "OAuth operation failed");
}

fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

/// Provider-agnostic OAuth client.
///
/// One instance serves every login attempt against its provider; the
/// per-attempt state lives in [`AuthorizationSession`]. The HTTP transport is
/// passed to each network operation.
#[derive(Clone)]
pub struct OAuthClient {
    config: ProviderConfig,
    settings: ClientSettings,
    clock: Arc<dyn Clock>,
    nonces: Arc<dyn NonceSource>,
}

impl fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClient")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Creates a client using the wall clock and the system CSPRNG.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            settings: ClientSettings::default(),
            clock: Arc::new(SystemClock),
            nonces: Arc::new(SystemNonce::default()),
        }
    }

    pub fn with_settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the timestamp source of signed requests.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the nonce source of signed requests.
    pub fn with_nonce_source(mut self, nonces: impl NonceSource + 'static) -> Self {
        self.nonces = Arc::new(nonces);
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Returns the URL the user must visit to grant access.
    ///
    /// Authorization-code providers get a pure URL. Signed-request providers
    /// first obtain a temporary token from the request-token endpoint, which
    /// the session keeps for the exchange step.
    #[instrument(skip_all, fields(grant_style = ?self.config.grant_style), level = "debug")]
    pub async fn build_authorization_url<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        session: &mut AuthorizationSession,
    ) -> Result<String, OAuthError> {
        let result = self.build_authorization_url_inner(http_client, session).await;
        result.inspect_err(log_failure)
    }

    async fn build_authorization_url_inner<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        session: &mut AuthorizationSession,
    ) -> Result<String, OAuthError> {
        require(BUILD_URL, "client_id", &self.config.client_id)?;
        require(BUILD_URL, "redirect_path", &self.config.redirect_path)?;
        require(BUILD_URL, "state", session.state())?;

        match self.config.grant_style {
            GrantStyle::AuthorizationCode => {
                let url = self.authorization_code_url(session.state());
                session.mark_url_issued(None);
                Ok(url)
            }
            GrantStyle::SignedRequest => {
                session.discard_request_token();
                let request_token = self.obtain_request_token(http_client, session.state()).await?;
                let query = encode_pairs(&[
                    ("oauth_token", request_token.token.as_str()),
                    ("state", session.state()),
                ]);
                let url = append_query(&self.config.authorization_endpoint, &query);
                session.mark_url_issued(Some(request_token));
                Ok(url)
            }
        }
    }

    /// Authorization endpoint with `client_id`, `redirect_uri`, `scope`, `state`
    /// and, when configured, `response_type`.
    fn authorization_code_url(&self, state: &str) -> String {
        let mut params = vec![
            ("client_id", self.config.client_id.clone()),
            ("redirect_uri", self.config.redirect_path.clone()),
        ];
        if !self.config.scopes.is_empty() {
            params.push(("scope", self.config.scopes.join(" ")));
        }
        params.push(("state", state.to_string()));
        if let Some(response_type) = &self.config.response_type {
            params.push(("response_type", response_type.clone()));
        }
        append_query(&self.config.authorization_endpoint, &encode_pairs(&params))
    }

    fn signed_params(&self, operation: &'static str) -> Result<OAuth1Params, OAuthError> {
        let nonce = self
            .nonces
            .nonce()
            .map_err(|_| OAuthError::protocol(operation, "nonce generation failed"))?;
        Ok(OAuth1Params::new(&self.config.client_id, nonce, self.clock.unix_timestamp()))
    }

    async fn obtain_request_token<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        state: &str,
    ) -> Result<RequestToken, OAuthError> {
        let endpoint = self
            .config
            .request_token_endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| OAuthError::configuration(BUILD_URL, "request_token_endpoint"))?;
        // The provider echoes the callback verbatim, so the state rides along in it.
        let callback = append_query(&self.config.redirect_path, &format!("state={}", encode_url_owned(state)));
        let mut oauth = self.signed_params(BUILD_URL)?.with_callback(callback);
        let app_secret = match &self.config.app_token {
            Some(app) => {
                oauth = oauth.with_token(&app.token);
                Some(app.secret.as_str())
            }
            None => None,
        };
        let signature = sign(HttpMethod::POST, endpoint, &oauth, &[], &self.config.client_secret, app_secret);
        let request = HttpRequest::new(HttpMethod::POST, endpoint)
            .with_header("Authorization", authorization_header(&oauth, &signature));

        let response = self.send(http_client, BUILD_URL, request).await?;
        let payload: SignedTokenPayload = self.decode_success(BUILD_URL, "request token endpoint", &response)?;
        payload
            .validate()
            .map_err(|e| OAuthError::protocol(BUILD_URL, e.to_string()))?;
        if let Some(confirmed) = &payload.oauth_callback_confirmed {
            if confirmed != "true" {
                return Err(OAuthError::protocol(BUILD_URL, "callback not confirmed by provider"));
            }
        }
        let token = payload.oauth_token.unwrap_or_default();
        let secret = payload.oauth_token_secret.unwrap_or_default();
        debug!("temporary token obtained");
        Ok(RequestToken { token, secret })
    }

    /// Trades the session's authorization code (or OAuth1 verifier) for an
    /// access token and stores it in the session.
    ///
    /// On failure the session holds no token, whatever it held before.
    #[instrument(skip_all, fields(grant_style = ?self.config.grant_style), level = "debug")]
    pub async fn exchange_code_for_token<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        session: &mut AuthorizationSession,
    ) -> Result<(), OAuthError> {
        let result = self.exchange_inner(http_client, session).await;
        result.inspect_err(log_failure)
    }

    async fn exchange_inner<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        session: &mut AuthorizationSession,
    ) -> Result<(), OAuthError> {
        require(EXCHANGE, "client_id", &self.config.client_id)?;
        require(EXCHANGE, "client_secret", &self.config.client_secret)?;
        require(EXCHANGE, "code", session.authorization_code())?;
        require(EXCHANGE, "state", session.state())?;

        session.clear_token();
        let token = match self.config.grant_style {
            GrantStyle::AuthorizationCode => {
                self.exchange_authorization_code(http_client, session.authorization_code()).await?
            }
            GrantStyle::SignedRequest => {
                let request_token = session
                    .request_token()
                    .cloned()
                    .ok_or_else(|| OAuthError::configuration(EXCHANGE, "request_token"))?;
                self.exchange_verifier(http_client, &request_token, session.authorization_code())
                    .await?
            }
        };
        session.store_token(token);
        debug!("access token acquired");
        Ok(())
    }

    async fn exchange_authorization_code<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        code: &str,
    ) -> Result<AccessToken, OAuthError> {
        let fields = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_path.as_str()),
        ];
        let request = HttpRequest::new(HttpMethod::POST, &self.config.token_endpoint);
        let request = match self.config.token_request_encoding {
            TokenRequestEncoding::Form => request
                .with_header("Content-Type", "application/x-www-form-urlencoded")
                .with_body(encode_pairs(&fields).into_bytes()),
            TokenRequestEncoding::Json => {
                let body: serde_json::Map<String, Value> =
                    fields.iter().map(|(k, v)| (k.to_string(), json!(v))).collect();
                request
                    .with_header("Content-Type", "application/json")
                    .with_body(Value::Object(body).to_string().into_bytes())
            }
        };

        let response = self.send(http_client, EXCHANGE, request).await?;
        let payload: TokenPayload = self.decode_success(EXCHANGE, "token endpoint", &response)?;
        if let Some(error) = payload.error.as_deref().filter(|e| !e.is_empty()) {
            let description = payload.error_description.as_deref().unwrap_or_default();
            return Err(OAuthError::protocol(
                EXCHANGE,
                format!("provider returned error {}: {}", error, description),
            ));
        }
        payload
            .validate()
            .map_err(|e| OAuthError::protocol(EXCHANGE, e.to_string()))?;
        let mut token = AccessToken::bearer(payload.access_token.unwrap_or_default());
        let account = Some(id_string(payload.account_id))
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| id_string(payload.uid));
        if !account.is_empty() {
            token = token.with_account_id(account);
        }
        Ok(token)
    }

    async fn exchange_verifier<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, OAuthError> {
        let oauth = self
            .signed_params(EXCHANGE)?
            .with_token(&request_token.token)
            .with_verifier(verifier);
        let endpoint = self.config.token_endpoint.as_str();
        let signature = sign(
            HttpMethod::POST,
            endpoint,
            &oauth,
            &[],
            &self.config.client_secret,
            Some(&request_token.secret),
        );
        let request = HttpRequest::new(HttpMethod::POST, endpoint)
            .with_header("Authorization", authorization_header(&oauth, &signature));

        let response = self.send(http_client, EXCHANGE, request).await?;
        let payload: SignedTokenPayload = self.decode_success(EXCHANGE, "token endpoint", &response)?;
        payload
            .validate()
            .map_err(|e| OAuthError::protocol(EXCHANGE, e.to_string()))?;
        let mut token = AccessToken::signed(
            payload.oauth_token.unwrap_or_default(),
            payload.oauth_token_secret.unwrap_or_default(),
        );
        let user_id = id_string(payload.user_id);
        if !user_id.is_empty() {
            token = token.with_account_id(user_id);
        }
        Ok(token)
    }

    /// Fetches the user profile and normalizes it.
    #[instrument(skip_all, fields(shape = ?self.config.profile.shape), level = "debug")]
    pub async fn fetch_profile<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        token: &AccessToken,
    ) -> Result<ProfileData, OAuthError> {
        let result = self.fetch_profile_inner(http_client, token).await;
        result.inspect_err(log_failure)
    }

    async fn fetch_profile_inner<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        token: &AccessToken,
    ) -> Result<ProfileData, OAuthError> {
        self.require_resource_access(FETCH_PROFILE, token)?;
        let profile = &self.config.profile;
        let url = self.config.resource_url(&profile.path);
        let request = self.authorized_request(FETCH_PROFILE, profile.method, url, token)?;
        let response = self.send(http_client, FETCH_PROFILE, request).await?;
        if !response.is_success() {
            return Err(OAuthError::protocol(
                FETCH_PROFILE,
                format!("profile endpoint returned HTTP {}", response.status),
            ));
        }
        normalize_profile(profile.shape, &response.body, response.content_type())
            .map_err(|e| OAuthError::protocol(FETCH_PROFILE, e.to_string()))
    }

    /// Lists the verified email addresses of the user.
    ///
    /// Records the provider marks as unverified are dropped before returning.
    /// An empty listing is `NotFound("user emails")`; a listing in which no
    /// record is verified is `NotFound("verified emails")`.
    #[instrument(skip_all, level = "debug")]
    pub async fn fetch_verified_emails<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        token: &AccessToken,
    ) -> Result<Vec<EmailRecord>, OAuthError> {
        let result = self.fetch_verified_emails_inner(http_client, token).await;
        result.inspect_err(log_failure)
    }

    async fn fetch_verified_emails_inner<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        token: &AccessToken,
    ) -> Result<Vec<EmailRecord>, OAuthError> {
        self.require_resource_access(FETCH_EMAILS, token)?;
        let path = self
            .config
            .emails_path
            .as_deref()
            .ok_or_else(|| OAuthError::configuration(FETCH_EMAILS, "emails_path"))?;
        let url = self.config.resource_url(path);
        let request = self.authorized_request(FETCH_EMAILS, HttpMethod::GET, url, token)?;
        let response = self.send(http_client, FETCH_EMAILS, request).await?;
        let records: Vec<EmailRecord> = self.decode_success(FETCH_EMAILS, "emails endpoint", &response)?;
        if records.is_empty() {
            return Err(OAuthError::not_found(FETCH_EMAILS, "user emails"));
        }
        let verified: Vec<EmailRecord> = records.into_iter().filter(|r| r.verified).collect();
        if verified.is_empty() {
            return Err(OAuthError::not_found(FETCH_EMAILS, "verified emails"));
        }
        Ok(verified)
    }

    /// [`fetch_profile`](Self::fetch_profile) for a session that completed its exchange.
    pub async fn fetch_session_profile<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        session: &AuthorizationSession,
    ) -> Result<ProfileData, OAuthError> {
        let token = session.require_token(FETCH_PROFILE).inspect_err(log_failure)?;
        self.fetch_profile(http_client, token).await
    }

    /// [`fetch_verified_emails`](Self::fetch_verified_emails) for a session that completed its exchange.
    pub async fn fetch_session_emails<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        session: &AuthorizationSession,
    ) -> Result<Vec<EmailRecord>, OAuthError> {
        let token = session.require_token(FETCH_EMAILS).inspect_err(log_failure)?;
        self.fetch_verified_emails(http_client, token).await
    }

    fn require_resource_access(&self, operation: &'static str, token: &AccessToken) -> Result<(), OAuthError> {
        require(operation, "client_id", &self.config.client_id)?;
        require(operation, "access_token", &token.token)?;
        require(operation, "resource_base_uri", &self.config.resource_base_uri)
    }

    fn authorized_request(
        &self,
        operation: &'static str,
        method: HttpMethod,
        url: String,
        token: &AccessToken,
    ) -> Result<HttpRequest, OAuthError> {
        let request = match self.config.profile.token_placement {
            TokenPlacement::QueryParameter => {
                let query = format!("access_token={}", encode_url_owned(&token.token));
                HttpRequest::new(method, append_query(&url, &query))
            }
            TokenPlacement::BearerHeader => {
                HttpRequest::new(method, url).with_header("Authorization", format!("Bearer {}", token.token))
            }
            TokenPlacement::SignedHeader => {
                let secret = token
                    .secret
                    .as_deref()
                    .ok_or_else(|| OAuthError::configuration(operation, "token_secret"))?;
                let oauth = self.signed_params(operation)?.with_token(&token.token);
                let signature = sign(method, &url, &oauth, &[], &self.config.client_secret, Some(secret));
                HttpRequest::new(method, url).with_header("Authorization", authorization_header(&oauth, &signature))
            }
        };
        Ok(request.with_header("Accept", "application/json"))
    }

    /// Executes a request under the configured timeout and body limit.
    async fn send<C: OAuthHttpClient>(
        &self,
        http_client: &C,
        operation: &'static str,
        request: HttpRequest,
    ) -> Result<HttpResponse, OAuthError> {
        let request = request.with_timeout(self.settings.timeout);
        debug!(operation, method = %request.method, endpoint = request.url.split('?').next().unwrap_or_default(), "sending request");
        let response = tokio::time::timeout(self.settings.timeout, http_client.execute(request))
            .await
            .map_err(|elapsed| OAuthError::network(operation, elapsed.into()))?
            .map_err(|e| OAuthError::network(operation, e))?;
        if response.body.len() > self.settings.max_body_size {
            return Err(OAuthError::network(
                operation,
                HttpClientError::BodyTooLarge { limit: self.settings.max_body_size },
            ));
        }
        debug!(operation, status = response.status, "response received");
        Ok(response)
    }

    fn decode_success<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        endpoint: &str,
        response: &HttpResponse,
    ) -> Result<T, OAuthError> {
        if !response.is_success() {
            return Err(OAuthError::protocol(
                operation,
                format!("{} returned HTTP {}", endpoint, response.status),
            ));
        }
        decode(&response.body, response.content_type())
            .map_err(|e| OAuthError::protocol(operation, e.to_string()))
    }
}
