//! OAuth token exchange and the cached access-token provider used by
//! the calendar client.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::core::AppConfig;

// Refresh a little before Google says the token expires so a request
// in flight doesn't race the expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

async fn request_token(token_url: &str, params: &[(&str, &str)]) -> Result<OAuthToken> {
    let res = Client::new().post(token_url).form(params).send().await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("Token request failed: {} ({})", status, text);
    }
    let token: OAuthToken = serde_json::from_str(&text)?;
    Ok(token)
}

/// Exchange a long lived refresh token for a fresh access token
pub async fn refresh_access_token(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<OAuthToken> {
    request_token(
        token_url,
        &[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ],
    )
    .await
}

/// Exchange the authorization code from the consent screen for tokens
pub async fn exchange_code_for_token(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<OAuthToken> {
    request_token(
        token_url,
        &[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ],
    )
    .await
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Credential provider for the Google APIs.
///
/// Built once at start up and shared by every request. The current
/// access token is cached until shortly before it expires or until
/// `invalidate` is called (e.g. after the API rejected it), after
/// which the next call refreshes it.
#[derive(Debug)]
pub struct GoogleAuth {
    token_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    cached: RwLock<Option<CachedToken>>,
}

impl GoogleAuth {
    pub fn new(
        token_url: &str,
        client_id: Option<String>,
        client_secret: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            token_url: token_url.to_string(),
            client_id,
            client_secret,
            refresh_token,
            cached: RwLock::new(None),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.google_token_url,
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_refresh_token.clone(),
        )
    }

    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }

    /// Returns a valid access token, refreshing it if needed.
    pub async fn access_token(&self) -> Result<String> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref()
                && token.expires_at > Utc::now()
            {
                return Ok(token.access_token.clone());
            }
        }
        self.refresh().await
    }

    /// Force a refresh and cache the result.
    pub async fn refresh(&self) -> Result<String> {
        let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
            self.refresh_token.as_deref(),
        ) else {
            return Err(anyhow!(
                "Google OAuth credentials are not configured (client id, secret and refresh token required)"
            ));
        };

        let mut cached = self.cached.write().await;
        let token =
            refresh_access_token(&self.token_url, client_id, client_secret, refresh_token).await?;
        let lifetime = token.expires_in.unwrap_or(3600) - EXPIRY_SKEW_SECS;
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(lifetime.max(0)),
        });
        tracing::debug!("Refreshed Google access token");

        Ok(token.access_token)
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        let mut cached = self.cached.write().await;
        if cached.take().is_some() {
            tracing::info!("Invalidated cached Google access token");
        }
    }
}
