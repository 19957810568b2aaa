use serde_json::json;
use starberry_oauth_client::oauth_core::signed_request::{authorization_header, sign, OAuth1Params};
use starberry_oauth_client::providers;
use starberry_oauth_client::{
    AuthorizationSession, FixedClock, FixedNonce, HttpMethod, HttpResponse, InMemoryHttpClient, OAuthClient,
    OAuthError, SessionPhase,
};

const REQUEST_TOKEN_URL: &str = "https://api.twitter.com/oauth/request_token";
const ACCESS_TOKEN_URL: &str = "https://api.twitter.com/oauth/access_token";
const VERIFY_URL: &str = "https://api.twitter.com/1.1/account/verify_credentials.json";
const TIMESTAMP: i64 = 1318622958;

fn twitter_client() -> OAuthClient {
    OAuthClient::new(providers::twitter("ck", "cs", "https://app/cb"))
        .with_clock(FixedClock(TIMESTAMP))
        .with_nonce_source(FixedNonce("fixednonce".to_string()))
}

fn twitter_mock() -> InMemoryHttpClient {
    let http = InMemoryHttpClient::new();
    http.insert_response(
        REQUEST_TOKEN_URL,
        HttpResponse::form(200, "oauth_token=RT&oauth_token_secret=RS&oauth_callback_confirmed=true"),
    );
    http.insert_response(
        ACCESS_TOKEN_URL,
        HttpResponse::form(200, "oauth_token=AT&oauth_token_secret=AS&user_id=42&screen_name=jack"),
    );
    http.insert_response(
        VERIFY_URL,
        HttpResponse::json(200, &json!({
            "id": 42,
            "id_str": "42",
            "name": "Jack",
            "screen_name": "jack",
            "profile_image_url_https": "https://pbs.twimg.com/jack.png"
        })),
    );
    http
}

#[tokio::test]
async fn test_authorization_url_obtains_temporary_token() {
    let client = twitter_client();
    let http = twitter_mock();
    let mut session = AuthorizationSession::new("xyz123");
    let url = client.build_authorization_url(&http, &mut session).await.unwrap();

    assert_eq!(url, "https://api.twitter.com/oauth/authorize?oauth_token=RT&state=xyz123");
    assert_eq!(session.phase(), SessionPhase::AuthorizationUrlIssued);
    assert_eq!(session.request_token().unwrap().secret, "RS");

    let requests = http.recorded_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::POST);
    assert_eq!(requests[0].url, REQUEST_TOKEN_URL);

    let oauth = OAuth1Params::new("ck", "fixednonce", TIMESTAMP).with_callback("https://app/cb?state=xyz123");
    let signature = sign(HttpMethod::POST, REQUEST_TOKEN_URL, &oauth, &[], "cs", None);
    assert_eq!(requests[0].header("authorization"), Some(authorization_header(&oauth, &signature).as_str()));
}

#[tokio::test]
async fn test_app_token_signs_request_token_call() {
    let config = providers::twitter("ck", "cs", "https://app/cb").with_app_token("APPT", "APPS");
    let client = OAuthClient::new(config)
        .with_clock(FixedClock(TIMESTAMP))
        .with_nonce_source(FixedNonce("fixednonce".to_string()));
    let http = twitter_mock();
    let mut session = AuthorizationSession::new("xyz123");
    client.build_authorization_url(&http, &mut session).await.unwrap();

    let oauth = OAuth1Params::new("ck", "fixednonce", TIMESTAMP)
        .with_callback("https://app/cb?state=xyz123")
        .with_token("APPT");
    let signature = sign(HttpMethod::POST, REQUEST_TOKEN_URL, &oauth, &[], "cs", Some("APPS"));
    let requests = http.recorded_requests().await;
    let header = requests[0].header("authorization").unwrap();
    assert!(header.contains("oauth_token=\"APPT\""));
    assert_eq!(header, authorization_header(&oauth, &signature));
}

#[tokio::test]
async fn test_full_signed_request_flow() {
    let client = twitter_client();
    let http = twitter_mock();
    let mut session = AuthorizationSession::new("xyz123");
    client.build_authorization_url(&http, &mut session).await.unwrap();
    session.receive_signed_callback("RT", "VERIFIER", "xyz123").unwrap();
    client.exchange_code_for_token(&http, &mut session).await.unwrap();

    let token = session.access_token().unwrap().clone();
    assert_eq!(token.token, "AT");
    assert_eq!(token.secret.as_deref(), Some("AS"));
    assert_eq!(token.account_id.as_deref(), Some("42"));
    assert!(session.request_token().is_none());

    let profile = client.fetch_session_profile(&http, &session).await.unwrap();
    assert_eq!(profile.id, "42");
    assert_eq!(profile.display_name, "Jack");
    assert_eq!(profile.email, "");
    assert_eq!(profile.avatar_url, "https://pbs.twimg.com/jack.png");

    let requests = http.recorded_requests().await;
    assert_eq!(requests.len(), 3);
    let exchange_header = requests[1].header("authorization").unwrap();
    assert!(exchange_header.contains("oauth_token=\"RT\""));
    assert!(exchange_header.contains("oauth_verifier=\"VERIFIER\""));
    let profile_header = requests[2].header("authorization").unwrap();
    assert!(profile_header.starts_with("OAuth "));
    assert!(profile_header.contains("oauth_token=\"AT\""));
    assert_eq!(requests[2].url, format!("{}?include_email=true", VERIFY_URL));
}

#[tokio::test]
async fn test_missing_temporary_secret_is_protocol_error() {
    let client = twitter_client();
    let http = InMemoryHttpClient::with_default(HttpResponse::form(200, "oauth_token=RT&oauth_callback_confirmed=true"));
    let mut session = AuthorizationSession::new("xyz123");
    let err = client.build_authorization_url(&http, &mut session).await.unwrap_err();
    match err {
        OAuthError::Protocol { reason, .. } => assert!(reason.contains("oauth_token_secret")),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(session.phase(), SessionPhase::Created);
    assert!(session.request_token().is_none());
}

#[tokio::test]
async fn test_failed_reissue_drops_earlier_temporary_token() {
    let client = twitter_client();
    let mut session = AuthorizationSession::new("xyz123");
    client.build_authorization_url(&twitter_mock(), &mut session).await.unwrap();
    assert_eq!(session.request_token().unwrap().token, "RT");

    let failing = InMemoryHttpClient::with_default(HttpResponse::form(500, "oops"));
    let err = client.build_authorization_url(&failing, &mut session).await.unwrap_err();
    assert!(matches!(err, OAuthError::Protocol { .. }));
    assert!(session.request_token().is_none());

    session.set_authorization_code("VERIFIER");
    let err = client
        .exchange_code_for_token(&twitter_mock(), &mut session)
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::Configuration { field: "request_token", .. }));
}

#[tokio::test]
async fn test_callback_with_foreign_temporary_token_is_rejected() {
    let client = twitter_client();
    let mut session = AuthorizationSession::new("xyz123");
    client.build_authorization_url(&twitter_mock(), &mut session).await.unwrap();
    let err = session.receive_signed_callback("OTHER", "VERIFIER", "xyz123").unwrap_err();
    assert!(matches!(err, OAuthError::Protocol { .. }));
    assert_eq!(session.phase(), SessionPhase::AuthorizationUrlIssued);
    assert_eq!(session.authorization_code(), "");
}

#[tokio::test]
async fn test_unconfirmed_callback_is_protocol_error() {
    let client = twitter_client();
    let http = InMemoryHttpClient::with_default(HttpResponse::form(
        200,
        "oauth_token=RT&oauth_token_secret=RS&oauth_callback_confirmed=false",
    ));
    let mut session = AuthorizationSession::new("xyz123");
    let err = client.build_authorization_url(&http, &mut session).await.unwrap_err();
    assert!(matches!(err, OAuthError::Protocol { .. }));
}

#[tokio::test]
async fn test_exchange_without_temporary_token() {
    let client = twitter_client();
    let mut session = AuthorizationSession::new("xyz123");
    session.set_authorization_code("VERIFIER");
    let err = client
        .exchange_code_for_token(&InMemoryHttpClient::new(), &mut session)
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::Configuration { field: "request_token", .. }));
}

#[tokio::test]
async fn test_missing_request_token_endpoint() {
    let mut config = providers::twitter("ck", "cs", "https://app/cb");
    config.request_token_endpoint = None;
    let client = OAuthClient::new(config);
    let mut session = AuthorizationSession::new("xyz123");
    let err = client
        .build_authorization_url(&InMemoryHttpClient::new(), &mut session)
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::Configuration { field: "request_token_endpoint", .. }));
}

#[tokio::test]
async fn test_signed_profile_needs_token_secret() {
    let client = twitter_client();
    let token = starberry_oauth_client::AccessToken::bearer("AT");
    let err = client.fetch_profile(&twitter_mock(), &token).await.unwrap_err();
    assert!(matches!(err, OAuthError::Configuration { field: "token_secret", .. }));
}
