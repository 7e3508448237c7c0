//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use dental_mcp::api::AppState;
use dental_mcp::api::app;
use dental_mcp::core::AppConfig;
use dental_mcp::google::{Attendee, CalendarApi, Event, EventDateTime};

/// In-memory calendar standing in for Google Calendar. Counts every
/// write so tests can assert that nothing was written.
#[derive(Default)]
pub struct FakeCalendar {
    events: Mutex<Vec<Event>>,
    next_id: AtomicUsize,
    writes: AtomicUsize,
}

impl FakeCalendar {
    pub fn with_events(events: Vec<Event>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events),
            ..Default::default()
        })
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn event(&self, event_id: &str) -> Option<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id() == event_id)
            .cloned()
    }

    pub fn all(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

fn overlaps(event: &Event, time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> bool {
    match (
        event.start.date_time,
        event.end.date_time,
        event.start.date,
        event.end.date,
    ) {
        (Some(start), Some(end), _, _) => start < time_max && end > time_min,
        (_, _, Some(start), Some(end)) => {
            start <= time_max.date_naive() && end > time_min.date_naive()
        }
        _ => false,
    }
}

#[async_trait]
impl CalendarApi for FakeCalendar {
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| overlaps(e, time_min, time_max))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start.date_time);
        Ok(events)
    }

    async fn get_event(&self, event_id: &str) -> Result<Event> {
        self.event(event_id)
            .ok_or_else(|| anyhow!("Calendar get failed: 404 Not Found"))
    }

    async fn insert_event(&self, event: &Event) -> Result<Event> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut created = event.clone();
        created.id = Some(format!("created_{}", n));
        created.status = Some(String::from("confirmed"));
        self.events.lock().unwrap().push(created.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn update_event(&self, event_id: &str, event: &Event) -> Result<Event> {
        let mut events = self.events.lock().unwrap();
        let Some(existing) = events.iter_mut().find(|e| e.id() == event_id) else {
            bail!("Calendar update failed: 404 Not Found");
        };
        *existing = event.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(event.clone())
    }

    async fn patch_event(&self, event_id: &str, patch: &Value) -> Result<Event> {
        let mut events = self.events.lock().unwrap();
        let Some(existing) = events.iter_mut().find(|e| e.id() == event_id) else {
            bail!("Calendar patch failed: 404 Not Found");
        };
        let mut merged = serde_json::to_value(&*existing)?;
        if let (Some(target), Some(fields)) = (merged.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        *existing = serde_json::from_value(merged)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(existing.clone())
    }
}

/// A calendar that is unreachable, e.g. bad credentials
pub struct FailingCalendar;

#[async_trait]
impl CalendarApi for FailingCalendar {
    async fn list_events(&self, _: DateTime<Utc>, _: DateTime<Utc>) -> Result<Vec<Event>> {
        bail!("Calendar list failed: 401 Unauthorized")
    }

    async fn get_event(&self, _: &str) -> Result<Event> {
        bail!("Calendar get failed: 401 Unauthorized")
    }

    async fn insert_event(&self, _: &Event) -> Result<Event> {
        bail!("Calendar insert failed: 401 Unauthorized")
    }

    async fn update_event(&self, _: &str, _: &Event) -> Result<Event> {
        bail!("Calendar update failed: 401 Unauthorized")
    }

    async fn patch_event(&self, _: &str, _: &Value) -> Result<Event> {
        bail!("Calendar patch failed: 401 Unauthorized")
    }
}

/// A 30 minute appointment in Amsterdam time with the patient as
/// attendee.
pub fn appointment(id: &str, patient: &str, email: &str, start: &str) -> Event {
    let start = DateTime::parse_from_rfc3339(start).unwrap();
    Event {
        id: Some(id.to_string()),
        summary: Some(format!("Afspraak - {}", patient)),
        description: Some(format!(
            "Type: controle\nPatiënt: {}\nEmail: {}",
            patient, email
        )),
        start: EventDateTime::timed(start, "Europe/Amsterdam"),
        end: EventDateTime::timed(start + Duration::minutes(30), "Europe/Amsterdam"),
        attendees: vec![Attendee {
            email: email.to_string(),
            display_name: Some(patient.to_string()),
            ..Default::default()
        }],
        status: Some(String::from("confirmed")),
        ..Default::default()
    }
}

/// Creates a test application router backed by `calendar` with the
/// default clinic config (Europe/Amsterdam, 09:00 - 17:00, 30 minutes).
pub fn test_app(calendar: Arc<dyn CalendarApi>) -> Router {
    let app_state = AppState::new(AppConfig::default(), calendar);
    app(Arc::new(app_state))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// POST a raw body to the MCP endpoint and parse the JSON reply
pub async fn post_mcp(app: &Router, body: &str) -> Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_str(&body_to_string(response.into_body()).await).unwrap()
}

pub async fn rpc(app: &Router, method: &str, params: Value) -> Value {
    let request = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
    post_mcp(app, &request.to_string()).await
}

pub async fn call_tool(app: &Router, name: &str, arguments: Value) -> Value {
    rpc(app, "tools/call", json!({"name": name, "arguments": arguments})).await
}

/// The JSON a successful tool call returned in its text content
pub fn tool_output(response: &Value) -> Value {
    assert_eq!(response["result"]["isError"], json!(false), "{}", response);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}
