//! OAuth 1.0a request signing (HMAC-SHA1) and `Authorization: OAuth` headers.

use super::crypto::hmac_sha1_base64;
use super::http_client::HttpMethod;
use super::url_encoding::{encode_url_owned, split_url};

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

/// Protocol parameters of one signed request, minus the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth1Params {
    pub consumer_key: String,
    pub nonce: String,
    pub timestamp: i64,
    pub token: Option<String>,
    pub callback: Option<String>,
    pub verifier: Option<String>,
}

impl OAuth1Params {
    pub fn new(consumer_key: impl Into<String>, nonce: impl Into<String>, timestamp: i64) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            nonce: nonce.into(),
            timestamp,
            token: None,
            callback: None,
            verifier: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }

    pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.verifier = Some(verifier.into());
        self
    }

    fn protocol_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), self.nonce.clone()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), self.timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some(token) = &self.token {
            pairs.push(("oauth_token".to_string(), token.clone()));
        }
        if let Some(callback) = &self.callback {
            pairs.push(("oauth_callback".to_string(), callback.clone()));
        }
        if let Some(verifier) = &self.verifier {
            pairs.push(("oauth_verifier".to_string(), verifier.clone()));
        }
        pairs
    }
}

/// Lowercases scheme and host and drops the query, per RFC 5849 §3.4.1.2.
fn normalized_base_url(url: &str) -> String {
    let (base, _) = split_url(url);
    match base.split_once("://") {
        Some((scheme, rest)) => {
            let (authority, path) = match rest.find('/') {
                Some(idx) => rest.split_at(idx),
                None => (rest, "/"),
            };
            format!("{}://{}{}", scheme.to_ascii_lowercase(), authority.to_ascii_lowercase(), path)
        }
        None => base.to_string(),
    }
}

/// Builds the signature base string: `METHOD&url&params`.
///
/// `params` are the OAuth protocol parameters plus any form body fields; the
/// URL's own query is folded in here.
pub fn signature_base_string(method: HttpMethod, url: &str, params: &[(String, String)]) -> String {
    let (_, query) = split_url(url);
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .chain(query.iter())
        .map(|(k, v)| (encode_url_owned(k), encode_url_owned(v)))
        .collect();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.as_str(),
        encode_url_owned(&normalized_base_url(url)),
        encode_url_owned(&param_string)
    )
}

/// Computes `oauth_signature` for a request.
pub fn sign(
    method: HttpMethod,
    url: &str,
    oauth: &OAuth1Params,
    body_params: &[(String, String)],
    consumer_secret: &str,
    token_secret: Option<&str>,
) -> String {
    let mut params = oauth.protocol_pairs();
    params.extend(body_params.iter().cloned());
    let base = signature_base_string(method, url, &params);
    let key = format!(
        "{}&{}",
        encode_url_owned(consumer_secret),
        encode_url_owned(token_secret.unwrap_or_default())
    );
    hmac_sha1_base64(key.as_bytes(), base.as_bytes())
}

/// Renders the `Authorization` header value carrying the signature.
pub fn authorization_header(oauth: &OAuth1Params, signature: &str) -> String {
    let mut pairs = oauth.protocol_pairs();
    pairs.push(("oauth_signature".to_string(), signature.to_string()));
    pairs.sort();
    let fields = pairs
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode_url_owned(k), encode_url_owned(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", fields)
}
