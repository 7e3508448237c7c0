use std::io::{self, Write};

use anyhow::{Result, anyhow};

use crate::core::AppConfig;
use crate::google::oauth::exchange_code_for_token;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_owned())
}

/// Walk through the consent screen and print the refresh token to put
/// in `DENTAL_GOOGLE_REFRESH_TOKEN`.
pub async fn run(config: &AppConfig, redirect_uri: &str) -> Result<()> {
    let client_id = config
        .google_client_id
        .as_deref()
        .ok_or(anyhow!("Set DENTAL_GOOGLE_CLIENT_ID or GOOGLE_OAUTH_CREDENTIALS in your environment"))?;
    let client_secret = config
        .google_client_secret
        .as_deref()
        .ok_or(anyhow!("Set DENTAL_GOOGLE_CLIENT_SECRET or GOOGLE_OAUTH_CREDENTIALS in your environment"))?;

    let auth_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(SCOPE)
    );
    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        auth_url
    );
    let code = prompt("Paste the authorization code shown by Google here: ")?;

    let token = exchange_code_for_token(
        &config.google_token_url,
        client_id,
        client_secret,
        &code,
        redirect_uri,
    )
    .await?;
    let refresh_token = token
        .refresh_token
        .ok_or(anyhow!("No refresh token in response"))?;

    println!("\nDENTAL_GOOGLE_REFRESH_TOKEN={}", refresh_token);
    Ok(())
}
