//! Interactive Twitter (OAuth 1.0a) login.
//! Run with: `TWITTER_CONSUMER_KEY=.. TWITTER_CONSUMER_SECRET=.. cargo run --example twitter_login`

use std::env;
use std::io::{self, BufRead, Write};

use starberry_oauth_client::providers;
use starberry_oauth_client::{AuthorizationSession, ClientSettings, OAuthClient, ReqwestHttpClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("starberry_oauth_client=debug")))
        .init();

    let key = env::var("TWITTER_CONSUMER_KEY")?;
    let secret = env::var("TWITTER_CONSUMER_SECRET")?;
    let redirect = env::var("TWITTER_REDIRECT_URI").unwrap_or_else(|_| "http://localhost:3000/callback".to_string());
    let mut config = providers::twitter(key, secret, redirect);
    if let (Ok(token), Ok(token_secret)) = (env::var("TWITTER_APP_TOKEN"), env::var("TWITTER_APP_TOKEN_SECRET")) {
        config = config.with_app_token(token, token_secret);
    }

    let settings = ClientSettings::default();
    let http = ReqwestHttpClient::new(&settings)?;
    let client = OAuthClient::new(config).with_settings(settings);

    let mut session = AuthorizationSession::with_random_state();
    let url = client.build_authorization_url(&http, &mut session).await?;
    println!("Open this URL and authorize the app:\n{}", url);

    print!("Paste the `oauth_token` query parameter from the callback: ");
    io::stdout().flush()?;
    let mut oauth_token = String::new();
    io::stdin().lock().read_line(&mut oauth_token)?;
    print!("Paste the `oauth_verifier` query parameter from the callback: ");
    io::stdout().flush()?;
    let mut verifier = String::new();
    io::stdin().lock().read_line(&mut verifier)?;
    let state = session.state().to_string();
    session.receive_signed_callback(oauth_token.trim(), verifier.trim(), &state)?;

    client.exchange_code_for_token(&http, &mut session).await?;
    let profile = client.fetch_session_profile(&http, &session).await?;
    println!("Logged in as {} ({}) {}", profile.display_name, profile.id, profile.avatar_url);
    Ok(())
}
