use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;

/// HTTP redirect policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// Do not follow redirections.
    None,
    /// Follow up to `u32` redirections.
    Limit(u32),
}

/// HTTP methods used by the OAuth flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    GET,
    POST,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP request for executing a call.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET, POST).
    pub method: HttpMethod,
    /// Target URL, including any query string.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
    /// Optional timeout duration.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a request with no headers, body or timeout.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), body: None, timeout: None }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// HTTP response from executing a call.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response carrying a JSON document.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: value.to_string().into_bytes(),
        }
    }

    /// A response carrying a form-encoded body.
    pub fn form(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: body.into().into_bytes(),
        }
    }

    /// A response with no content type, left for the decoder to sniff.
    pub fn raw(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Error type for HTTP client operations.
#[derive(Debug, Clone, Error)]
pub enum HttpClientError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<tokio::time::error::Elapsed> for HttpClientError {
    fn from(_err: tokio::time::error::Elapsed) -> Self {
        Self::Timeout
    }
}

/// Future returned by [`OAuthHttpClient::execute`].
pub type HttpFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError>> + Send + 'static>>;

/// Generic HTTP client interface for OAuth flows.
///
/// Implementations read the whole body before resolving, so no connection
/// or response handle outlives the call on any path.
pub trait OAuthHttpClient: Send + Sync + Clone + 'static {
    /// Execute an HTTP request asynchronously.
    fn execute(&self, request: HttpRequest) -> HttpFuture;
}

/// In-memory HTTP client stub for testing.
///
/// Responses are looked up by full URL first, then by the URL with its
/// query string removed, then the default response.
#[derive(Clone, Default)]
pub struct InMemoryHttpClient {
    responses: Arc<DashMap<String, Result<HttpResponse, HttpClientError>>>,
    default_response: Option<HttpResponse>,
    latency: Option<Duration>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl InMemoryHttpClient {
    /// Creates a new in-memory HTTP client with no default response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory HTTP client with a default response on miss.
    pub fn with_default(response: HttpResponse) -> Self {
        Self { default_response: Some(response), ..Self::default() }
    }

    /// Delays every response, to exercise timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register a mock response for a specific URL.
    pub fn insert_response(&self, url: impl Into<String>, response: HttpResponse) {
        self.responses.insert(url.into(), Ok(response));
    }

    /// Register a transport failure for a specific URL.
    pub fn insert_failure(&self, url: impl Into<String>, error: HttpClientError) {
        self.responses.insert(url.into(), Err(error));
    }

    /// Every request executed so far, in order.
    pub async fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().await.clone()
    }
}

impl OAuthHttpClient for InMemoryHttpClient {
    fn execute(&self, request: HttpRequest) -> HttpFuture {
        let responses = self.responses.clone();
        let default = self.default_response.clone();
        let latency = self.latency;
        let requests = self.requests.clone();
        Box::pin(async move {
            let url = request.url.clone();
            requests.lock().await.push(request);
            if let Some(delay) = latency {
                tokio::time::sleep(delay).await;
            }
            let without_query = url.split('?').next().unwrap_or(&url).to_string();
            if let Some(entry) = responses.get(&url) {
                entry.value().clone()
            } else if let Some(entry) = responses.get(&without_query) {
                entry.value().clone()
            } else if let Some(resp) = default {
                Ok(resp)
            } else {
                Err(HttpClientError::Connect(format!("no mock response for {}", without_query)))
            }
        })
    }
}

#[cfg(feature = "reqwest-client")]
pub use reqwest_client::ReqwestHttpClient;

#[cfg(feature = "reqwest-client")]
mod reqwest_client {
    use super::*;
    use crate::oauth_core::config::ClientSettings;

    /// Production HTTP client backed by a shared `reqwest::Client`.
    #[derive(Clone)]
    pub struct ReqwestHttpClient {
        client: reqwest::Client,
        max_body_size: usize,
    }

    impl ReqwestHttpClient {
        /// Builds a client honouring the redirect policy, timeout and body limit of `settings`.
        pub fn new(settings: &ClientSettings) -> Result<Self, HttpClientError> {
            let redirect = match settings.redirect_policy {
                RedirectPolicy::None => reqwest::redirect::Policy::none(),
                RedirectPolicy::Limit(n) => reqwest::redirect::Policy::limited(n as usize),
            };
            let client = reqwest::Client::builder()
                .redirect(redirect)
                .timeout(settings.timeout)
                .build()
                .map_err(classify)?;
            Ok(Self { client, max_body_size: settings.max_body_size })
        }
    }

    fn classify(err: reqwest::Error) -> HttpClientError {
        if err.is_timeout() {
            HttpClientError::Timeout
        } else if err.is_connect() {
            HttpClientError::Connect(err.to_string())
        } else {
            HttpClientError::Transport(err.to_string())
        }
    }

    impl OAuthHttpClient for ReqwestHttpClient {
        fn execute(&self, request: HttpRequest) -> HttpFuture {
            let client = self.client.clone();
            let max_body = self.max_body_size;
            Box::pin(async move {
                let method = match request.method {
                    HttpMethod::GET => reqwest::Method::GET,
                    HttpMethod::POST => reqwest::Method::POST,
                };
                let mut builder = client.request(method, request.url.as_str());
                for (k, v) in &request.headers {
                    builder = builder.header(k.as_str(), v.as_str());
                }
                if let Some(body) = request.body {
                    builder = builder.body(body);
                }
                if let Some(timeout) = request.timeout {
                    builder = builder.timeout(timeout);
                }
                let response = builder.send().await.map_err(classify)?;
                if response.content_length().is_some_and(|len| len as usize > max_body) {
                    return Err(HttpClientError::BodyTooLarge { limit: max_body });
                }
                let status = response.status().as_u16();
                let headers = response
                    .headers()
                    .iter()
                    .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
                    .collect();
                let body = response.bytes().await.map_err(classify)?;
                if body.len() > max_body {
                    return Err(HttpClientError::BodyTooLarge { limit: max_body });
                }
                Ok(HttpResponse { status, headers, body: body.to_vec() })
            })
        }
    }
}
