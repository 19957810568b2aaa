use std::time::Duration;

use serde_json::json;
use starberry_oauth_client::oauth_core::url_encoding::parse_query;
use starberry_oauth_client::providers;
use starberry_oauth_client::{
    AuthorizationSession, ClientSettings, HttpClientError, HttpResponse, InMemoryHttpClient, OAuthClient,
    OAuthError, SessionPhase, TokenRequestEncoding,
};

const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

fn github_client() -> OAuthClient {
    OAuthClient::new(providers::github("abc", "shh", "https://app/cb"))
}

fn session_with_code() -> AuthorizationSession {
    let mut session = AuthorizationSession::new("xyz123");
    session.receive_callback("CODE42", "xyz123").unwrap();
    session
}

#[tokio::test]
async fn test_github_authorization_url() {
    let client = github_client();
    let mut session = AuthorizationSession::new("xyz123");
    let url = client
        .build_authorization_url(&InMemoryHttpClient::new(), &mut session)
        .await
        .unwrap();
    assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
    assert!(url.contains("state=xyz123"));
    assert!(url.contains("redirect_uri=https%3A%2F%2Fapp%2Fcb"));
    assert_eq!(session.phase(), SessionPhase::AuthorizationUrlIssued);
}

#[tokio::test]
async fn test_authorization_url_round_trips() {
    let client = github_client();
    let mut session = AuthorizationSession::new("state with spaces&symbols=1");
    let url = client
        .build_authorization_url(&InMemoryHttpClient::new(), &mut session)
        .await
        .unwrap();
    let (_, query) = url.split_once('?').unwrap();
    let pairs = parse_query(query);
    assert!(pairs.contains(&("client_id".to_string(), "abc".to_string())));
    assert!(pairs.contains(&("redirect_uri".to_string(), "https://app/cb".to_string())));
    assert!(pairs.contains(&("scope".to_string(), "user".to_string())));
    assert!(pairs.contains(&("state".to_string(), "state with spaces&symbols=1".to_string())));
}

#[tokio::test]
async fn test_dropbox_url_carries_response_type() {
    let client = OAuthClient::new(providers::dropbox("key", "secret", "https://app/cb"));
    let mut session = AuthorizationSession::new("s1");
    let url = client
        .build_authorization_url(&InMemoryHttpClient::new(), &mut session)
        .await
        .unwrap();
    assert!(url.starts_with("https://www.dropbox.com/oauth2/authorize?"));
    assert!(url.contains("response_type=code"));
}

#[tokio::test]
async fn test_missing_state_is_configuration_error() {
    let client = github_client();
    let mut session = AuthorizationSession::new("");
    let err = client
        .build_authorization_url(&InMemoryHttpClient::new(), &mut session)
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::Configuration { field: "state", .. }));
    assert_eq!(session.phase(), SessionPhase::Created);
}

#[tokio::test]
async fn test_missing_client_id_never_reaches_network() {
    // No mock responses: any request would fail as a network error.
    let http = InMemoryHttpClient::new();
    for config in [
        providers::github("", "shh", "https://app/cb"),
        providers::twitter("", "shh", "https://app/cb"),
    ] {
        let client = OAuthClient::new(config);
        let mut session = AuthorizationSession::new("xyz123");
        let err = client.build_authorization_url(&http, &mut session).await.unwrap_err();
        assert!(matches!(err, OAuthError::Configuration { field: "client_id", .. }));

        let mut session = session_with_code();
        let err = client.exchange_code_for_token(&http, &mut session).await.unwrap_err();
        assert!(matches!(err, OAuthError::Configuration { field: "client_id", .. }));

        let token = starberry_oauth_client::AccessToken::bearer("T");
        let err = client.fetch_profile(&http, &token).await.unwrap_err();
        assert!(matches!(err, OAuthError::Configuration { field: "client_id", .. }));

        let err = client.fetch_verified_emails(&http, &token).await.unwrap_err();
        assert!(matches!(err, OAuthError::Configuration { field: "client_id", .. }));
    }
    assert!(http.recorded_requests().await.is_empty());
}

#[tokio::test]
async fn test_exchange_json_and_form_normalize_identically() {
    let client = github_client();
    let responses = [
        HttpResponse::json(200, &json!({"access_token": "T", "token_type": "bearer", "scope": "user"})),
        HttpResponse::form(200, "access_token=T&scope=user&token_type=bearer"),
        HttpResponse::raw(200, "access_token=T&token_type=bearer"),
    ];
    for resp in responses {
        let http = InMemoryHttpClient::with_default(resp);
        let mut session = session_with_code();
        client.exchange_code_for_token(&http, &mut session).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::TokenAcquired);
        assert_eq!(session.access_token().unwrap().token, "T");
    }
}

#[tokio::test]
async fn test_exchange_sends_all_five_fields() {
    let client = github_client();
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::json(200, &json!({"access_token": "T"})));
    let mut session = session_with_code();
    client.exchange_code_for_token(&http, &mut session).await.unwrap();

    let requests = http.recorded_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header("content-type"), Some("application/x-www-form-urlencoded"));
    let body = String::from_utf8(requests[0].body.clone().unwrap()).unwrap();
    let pairs = parse_query(&body);
    for (k, v) in [
        ("client_id", "abc"),
        ("client_secret", "shh"),
        ("code", "CODE42"),
        ("grant_type", "authorization_code"),
        ("redirect_uri", "https://app/cb"),
    ] {
        assert!(pairs.contains(&(k.to_string(), v.to_string())), "missing {}", k);
    }
}

#[tokio::test]
async fn test_exchange_json_request_body() {
    let config = providers::dropbox("key", "secret", "https://app/cb")
        .with_token_request_encoding(TokenRequestEncoding::Json);
    let client = OAuthClient::new(config);
    let http = InMemoryHttpClient::with_default(HttpResponse::json(
        200,
        &json!({"access_token": "DBT", "account_id": "dbid:AAH4", "uid": "12345"}),
    ));
    let mut session = session_with_code();
    client.exchange_code_for_token(&http, &mut session).await.unwrap();

    let token = session.access_token().unwrap();
    assert_eq!(token.token, "DBT");
    assert_eq!(token.account_id.as_deref(), Some("dbid:AAH4"));

    let requests = http.recorded_requests().await;
    let body: serde_json::Value = serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
    assert_eq!(body["grant_type"], "authorization_code");
    assert_eq!(body["code"], "CODE42");
}

#[tokio::test]
async fn test_exchange_accepts_numeric_account_id() {
    let client = OAuthClient::new(providers::dropbox("key", "secret", "https://app/cb"));
    for (body, expected) in [
        (json!({"access_token": "T", "uid": 12345}), "12345"),
        (json!({"access_token": "T", "account_id": 987, "uid": "12345"}), "987"),
        (json!({"access_token": "T", "account_id": "", "uid": 12345}), "12345"),
    ] {
        let http = InMemoryHttpClient::with_default(HttpResponse::json(200, &body));
        let mut session = session_with_code();
        client.exchange_code_for_token(&http, &mut session).await.unwrap();
        let token = session.access_token().unwrap();
        assert_eq!(token.token, "T");
        assert_eq!(token.account_id.as_deref(), Some(expected));
    }

    let http = InMemoryHttpClient::with_default(HttpResponse::json(200, &json!({"access_token": "T", "uid": null})));
    let mut session = session_with_code();
    client.exchange_code_for_token(&http, &mut session).await.unwrap();
    assert!(session.access_token().unwrap().account_id.is_none());
}

#[tokio::test]
async fn test_exchange_empty_token_is_protocol_error() {
    let client = github_client();
    for resp in [
        HttpResponse::json(200, &json!({"access_token": ""})),
        HttpResponse::json(200, &json!({"token_type": "bearer"})),
        HttpResponse::form(200, "scope=user"),
    ] {
        let http = InMemoryHttpClient::with_default(resp);
        let mut session = session_with_code();
        let err = client.exchange_code_for_token(&http, &mut session).await.unwrap_err();
        assert!(matches!(err, OAuthError::Protocol { .. }));
        assert!(session.access_token().is_none());
        assert_eq!(session.phase(), SessionPhase::CodeReceived);
    }
}

#[tokio::test]
async fn test_exchange_provider_error_in_success_body() {
    let client = github_client();
    let http = InMemoryHttpClient::with_default(HttpResponse::form(
        200,
        "error=bad_verification_code&error_description=The+code+passed+is+incorrect+or+expired.",
    ));
    let mut session = session_with_code();
    let err = client.exchange_code_for_token(&http, &mut session).await.unwrap_err();
    match err {
        OAuthError::Protocol { reason, .. } => assert!(reason.contains("bad_verification_code")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_exchange_error_status_and_garbage_body() {
    let client = github_client();
    for resp in [
        HttpResponse::json(400, &json!({"error": "invalid_grant"})),
        HttpResponse::raw(200, "{not json"),
    ] {
        let http = InMemoryHttpClient::with_default(resp);
        let mut session = session_with_code();
        let err = client.exchange_code_for_token(&http, &mut session).await.unwrap_err();
        assert!(matches!(err, OAuthError::Protocol { .. }));
    }
}

#[tokio::test]
async fn test_failed_reexchange_drops_previous_token() {
    let client = github_client();
    let mut session = session_with_code();
    let ok = InMemoryHttpClient::with_default(HttpResponse::json(200, &json!({"access_token": "OLD"})));
    client.exchange_code_for_token(&ok, &mut session).await.unwrap();

    let failing = InMemoryHttpClient::new();
    failing.insert_failure(TOKEN_URL, HttpClientError::Connect("refused".into()));
    let err = client.exchange_code_for_token(&failing, &mut session).await.unwrap_err();
    assert!(matches!(err, OAuthError::Network { .. }));
    assert!(session.access_token().is_none());
    assert_ne!(session.phase(), SessionPhase::TokenAcquired);
}

#[tokio::test]
async fn test_restarting_flow_discards_previous_token() {
    let client = github_client();
    let http = InMemoryHttpClient::with_default(HttpResponse::json(200, &json!({"access_token": "OLD"})));
    let mut session = session_with_code();
    client.exchange_code_for_token(&http, &mut session).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::TokenAcquired);

    client.build_authorization_url(&http, &mut session).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::AuthorizationUrlIssued);
    assert!(session.access_token().is_none());
    assert_eq!(session.authorization_code(), "");
    assert!(client.fetch_session_profile(&http, &session).await.is_err());
    assert!(session.into_access_token().is_none());
}

#[tokio::test]
async fn test_exchange_without_code_is_configuration_error() {
    let client = github_client();
    let mut session = AuthorizationSession::new("xyz123");
    let err = client
        .exchange_code_for_token(&InMemoryHttpClient::new(), &mut session)
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::Configuration { field: "code", .. }));
}

#[tokio::test]
async fn test_exchange_without_secret_is_configuration_error() {
    let client = OAuthClient::new(providers::github("abc", "", "https://app/cb"));
    let mut session = session_with_code();
    let err = client
        .exchange_code_for_token(&InMemoryHttpClient::new(), &mut session)
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::Configuration { field: "client_secret", .. }));
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let client = github_client().with_settings(ClientSettings::new().with_timeout(Duration::from_millis(20)));
    let http = InMemoryHttpClient::with_default(HttpResponse::json(200, &json!({"access_token": "T"})))
        .with_latency(Duration::from_millis(500));
    let mut session = session_with_code();
    let err = client.exchange_code_for_token(&http, &mut session).await.unwrap_err();
    assert!(matches!(
        err,
        OAuthError::Network { source: HttpClientError::Timeout, .. }
    ));
    assert!(session.access_token().is_none());
}

#[tokio::test]
async fn test_oversized_body_is_network_error() {
    let client = github_client().with_settings(ClientSettings::new().with_max_body_size(8));
    let http = InMemoryHttpClient::with_default(HttpResponse::json(200, &json!({"access_token": "T"})));
    let mut session = session_with_code();
    let err = client.exchange_code_for_token(&http, &mut session).await.unwrap_err();
    assert!(matches!(
        err,
        OAuthError::Network { source: HttpClientError::BodyTooLarge { limit: 8 }, .. }
    ));
}

#[tokio::test]
async fn test_session_hands_over_token() {
    let client = github_client();
    let http = InMemoryHttpClient::with_default(HttpResponse::json(200, &json!({"access_token": "T"})));
    let mut session = session_with_code();
    client.exchange_code_for_token(&http, &mut session).await.unwrap();
    let token = session.into_access_token().unwrap();
    assert_eq!(token.token, "T");
    assert!(token.secret.is_none());
}
