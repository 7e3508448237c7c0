use std::env;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::appointments::BusinessHours;

const DEFAULT_TIMEZONE: &str = "Europe/Amsterdam";
const DEFAULT_GOOGLE_API_URL: &str = "https://www.googleapis.com";
const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub calendar_id: String,
    pub timezone: Tz,
    pub business_hours: BusinessHours,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_refresh_token: Option<String>,
    pub google_api_url: String,
    pub google_token_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            calendar_id: String::from("primary"),
            timezone: chrono_tz::Europe::Amsterdam,
            business_hours: BusinessHours::default(),
            google_client_id: None,
            google_client_secret: None,
            google_refresh_token: None,
            google_api_url: DEFAULT_GOOGLE_API_URL.to_string(),
            google_token_url: DEFAULT_GOOGLE_TOKEN_URL.to_string(),
        }
    }
}

/// Shape of the `GOOGLE_OAUTH_CREDENTIALS` blob. Accepts both the
/// "installed app" wrapper written by Google's tooling and a flat
/// authorized-user object.
#[derive(Debug, Default, Deserialize)]
struct OAuthCredentialsBlob {
    installed: Option<Box<OAuthCredentialsBlob>>,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
}

impl AppConfig {
    /// Build the config from environment variables, falling back to
    /// defaults for anything unset. Malformed values are an error so
    /// the server refuses to start instead of serving wrong slots.
    pub fn from_env() -> Result<Self> {
        let calendar_id = env::var("DENTAL_CALENDAR_ID")
            .or_else(|_| env::var("GOOGLE_CALENDAR_ID"))
            .unwrap_or_else(|_| "primary".to_string());

        let timezone_name =
            env::var("DENTAL_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow!("Invalid DENTAL_TIMEZONE {}: {}", timezone_name, e))?;

        let defaults = BusinessHours::default();
        let start = match env::var("DENTAL_BUSINESS_HOURS_START") {
            Ok(s) => parse_clock(&s).context("Invalid DENTAL_BUSINESS_HOURS_START")?,
            Err(_) => defaults.start,
        };
        let end = match env::var("DENTAL_BUSINESS_HOURS_END") {
            Ok(s) => parse_clock(&s).context("Invalid DENTAL_BUSINESS_HOURS_END")?,
            Err(_) => defaults.end,
        };
        let slot_minutes = match env::var("DENTAL_SLOT_MINUTES") {
            Ok(s) => s
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid DENTAL_SLOT_MINUTES {}", s))?,
            Err(_) => defaults.slot_minutes,
        };
        let business_hours = BusinessHours::new(start, end, slot_minutes)?;

        let blob = match env::var("GOOGLE_OAUTH_CREDENTIALS") {
            Ok(raw) => parse_credentials_blob(&raw)?,
            Err(_) => OAuthCredentialsBlob::default(),
        };
        let google_client_id = env::var("DENTAL_GOOGLE_CLIENT_ID").ok().or(blob.client_id);
        let google_client_secret = env::var("DENTAL_GOOGLE_CLIENT_SECRET")
            .ok()
            .or(blob.client_secret);
        let google_refresh_token = env::var("DENTAL_GOOGLE_REFRESH_TOKEN")
            .ok()
            .or(blob.refresh_token);

        let google_api_url =
            env::var("DENTAL_GOOGLE_API_URL").unwrap_or_else(|_| DEFAULT_GOOGLE_API_URL.to_string());
        let google_token_url = env::var("DENTAL_GOOGLE_TOKEN_URL")
            .unwrap_or_else(|_| DEFAULT_GOOGLE_TOKEN_URL.to_string());

        Ok(Self {
            calendar_id,
            timezone,
            business_hours,
            google_client_id,
            google_client_secret,
            google_refresh_token,
            google_api_url,
            google_token_url,
        })
    }
}

fn parse_clock(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| anyhow!("{}: {}", s, e))
}

fn parse_credentials_blob(raw: &str) -> Result<OAuthCredentialsBlob> {
    let blob: OAuthCredentialsBlob =
        serde_json::from_str(raw).context("GOOGLE_OAUTH_CREDENTIALS is not valid JSON")?;
    let flattened = match blob.installed {
        Some(installed) => OAuthCredentialsBlob {
            installed: None,
            client_id: installed.client_id.or(blob.client_id),
            client_secret: installed.client_secret.or(blob.client_secret),
            refresh_token: installed.refresh_token.or(blob.refresh_token),
        },
        None => blob,
    };
    if flattened.client_id.is_none() && flattened.refresh_token.is_none() {
        bail!("GOOGLE_OAUTH_CREDENTIALS has neither client_id nor refresh_token");
    }
    Ok(flattened)
}
