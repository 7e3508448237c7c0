//! Google Calendar v3 events client

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use super::oauth::GoogleAuth;

/// Start or end of an event. Timed events carry `dateTime`, all-day
/// events carry `date` (the end date is exclusive).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn timed(at: DateTime<FixedOffset>, time_zone: &str) -> Self {
        Self {
            date_time: Some(at),
            date: None,
            time_zone: Some(time_zone.to_string()),
        }
    }

    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date_time: None,
            date: Some(date),
            time_zone: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    #[serde(default)]
    pub email: String,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminders {
    #[serde(rename = "useDefault")]
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ReminderOverride>,
}

/// A calendar event as the events API returns it. Fields this service
/// doesn't model are kept in `extra` so a full update writes them
/// back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub start: EventDateTime,
    #[serde(default)]
    pub end: EventDateTime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(rename = "htmlLink", skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct EventsPage {
    #[serde(default)]
    items: Vec<Event>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// The calendar operations the clinic needs from its system of record.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Events overlapping `[time_min, time_max)`, recurring events
    /// expanded, ordered by start time.
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    async fn get_event(&self, event_id: &str) -> Result<Event>;

    async fn insert_event(&self, event: &Event) -> Result<Event>;

    /// Full replace of the event.
    async fn update_event(&self, event_id: &str, event: &Event) -> Result<Event>;

    /// Partial update, only the fields present in `patch` change.
    async fn patch_event(&self, event_id: &str, patch: &Value) -> Result<Event>;
}

pub struct GoogleCalendar {
    client: Client,
    api_url: String,
    calendar_id: String,
    auth: Arc<GoogleAuth>,
}

impl GoogleCalendar {
    pub fn new(api_url: &str, calendar_id: &str, auth: Arc<GoogleAuth>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            calendar_id: calendar_id.to_string(),
            auth,
        }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendar/v3/calendars/{}/events",
            self.api_url,
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, action: &str) -> Result<T> {
        let access_token = self.auth.access_token().await?;
        let res = req.bearer_auth(access_token).send().await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.auth.invalidate().await;
        }
        if !status.is_success() {
            bail!("Calendar {} failed: {} ({})", action, status, text);
        }
        let parsed: T = serde_json::from_str(&text)?;
        Ok(parsed)
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendar {
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let url = self.events_url();
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", String::from("true")),
                ("orderBy", String::from("startTime")),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let page: EventsPage = self
                .send(self.client.get(&url).query(&query), "list events")
                .await?;
            events.extend(page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(events)
    }

    async fn get_event(&self, event_id: &str) -> Result<Event> {
        self.send(self.client.get(self.event_url(event_id)), "get event")
            .await
    }

    async fn insert_event(&self, event: &Event) -> Result<Event> {
        self.send(self.client.post(self.events_url()).json(event), "insert event")
            .await
    }

    async fn update_event(&self, event_id: &str, event: &Event) -> Result<Event> {
        self.send(
            self.client.put(self.event_url(event_id)).json(event),
            "update event",
        )
        .await
    }

    async fn patch_event(&self, event_id: &str, patch: &Value) -> Result<Event> {
        self.send(
            self.client.patch(self.event_url(event_id)).json(patch),
            "patch event",
        )
        .await
    }
}
