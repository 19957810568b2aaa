//! Interactive GitHub login.
//! Run with: `GITHUB_CLIENT_ID=.. GITHUB_CLIENT_SECRET=.. cargo run --example github_login`

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

    let client_id = env::var("GITHUB_CLIENT_ID")?;
    let client_secret = env::var("GITHUB_CLIENT_SECRET")?;
    let redirect = env::var("GITHUB_REDIRECT_URI").unwrap_or_else(|_| "http://localhost:3000/callback".to_string());

    let settings = ClientSettings::default();
    let http = ReqwestHttpClient::new(&settings)?;
    let client = OAuthClient::new(providers::github(client_id, client_secret, redirect)).with_settings(settings);

    let mut session = AuthorizationSession::with_random_state();
    let url = client.build_authorization_url(&http, &mut session).await?;
    println!("Open this URL and authorize the app:\n{}", url);

    print!("Paste the `code` query parameter from the callback: ");
    io::stdout().flush()?;
    let mut code = String::new();
    io::stdin().lock().read_line(&mut code)?;
    let state = session.state().to_string();
    session.receive_callback(code.trim(), &state)?;

    client.exchange_code_for_token(&http, &mut session).await?;
    let profile = client.fetch_session_profile(&http, &session).await?;
    println!("Logged in as {} ({})", profile.display_name, profile.id);
    match client.fetch_session_emails(&http, &session).await {
        Ok(emails) => {
            for email in emails {
                println!("  {} primary={} visibility={}", email.address, email.primary, email.visibility);
            }
        }
        Err(err) => println!("  no emails: {}", err),
    }
    Ok(())
}
