//! Tools exposed over the MCP endpoint

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::appointments::{AppointmentTarget, Clinic};

pub mod book;
pub use book::BookAppointmentTool;

pub mod cancel;
pub use cancel::CancelAppointmentTool;

pub mod check_slots;
pub use check_slots::CheckAvailableSlotsTool;

pub mod details;
pub use details::GetAppointmentDetailsTool;

pub mod list;
pub use list::ListAppointmentsTool;

pub mod reschedule;
pub use reschedule::RescheduleAppointmentTool;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Bad or missing arguments. Reported back to the caller as a
    /// failed tool result, not a protocol error.
    #[error("{0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The calendar or its credentials failed
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

#[derive(Serialize)]
pub struct Property {
    pub r#type: String,
    pub description: String,
}

impl Property {
    pub fn string(description: &str) -> Self {
        Self {
            r#type: String::from("string"),
            description: description.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct InputSchema<Props: Serialize> {
    pub r#type: String,
    pub properties: Props,
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

impl<Props: Serialize> InputSchema<Props> {
    pub fn object(properties: Props, required: &[&str]) -> Self {
        Self {
            r#type: String::from("object"),
            properties,
            required: required.iter().map(|s| s.to_string()).collect(),
            additional_properties: false,
        }
    }
}

/// The MCP tool definition as listed by `tools/list`
#[derive(Serialize)]
pub struct ToolDefinition<Props: Serialize> {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: InputSchema<Props>,
}

// Tools are listed by serializing the trait objects themselves, which
// needs `erased_serde` since `serde::Serialize` isn't object safe.
#[async_trait]
pub trait ToolCall: erased_serde::Serialize {
    async fn call(&self, args: Value) -> Result<Value, ToolError>;
    fn function_name(&self) -> String;
}
erased_serde::serialize_trait_object!(ToolCall);

pub type BoxedToolCall = Box<dyn ToolCall + Send + Sync + 'static>;

pub struct ToolRegistry {
    tools: Vec<BoxedToolCall>,
}

impl ToolRegistry {
    pub fn new(clinic: Arc<Clinic>) -> Self {
        let tools: Vec<BoxedToolCall> = vec![
            Box::new(CheckAvailableSlotsTool::new(Arc::clone(&clinic))),
            Box::new(BookAppointmentTool::new(Arc::clone(&clinic))),
            Box::new(ListAppointmentsTool::new(Arc::clone(&clinic))),
            Box::new(GetAppointmentDetailsTool::new(Arc::clone(&clinic))),
            Box::new(CancelAppointmentTool::new(Arc::clone(&clinic))),
            Box::new(RescheduleAppointmentTool::new(clinic)),
        ];
        Self { tools }
    }

    pub fn tools(&self) -> &[BoxedToolCall] {
        &self.tools
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.function_name()).collect()
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.function_name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tracing::info!("Calling tool {}", name);
        tool.call(args).await
    }
}

// Argument helpers shared by the tools

/// Deserialize tool arguments, treating absent arguments as `{}`.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| ToolError::InvalidArguments(format!("Invalid arguments: {}", e)))
}

/// A required argument that must also be non-blank.
pub fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ToolError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ToolError::InvalidArguments(format!("{} is required", field))),
    }
}

/// An optional argument, blank counts as absent.
pub fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ToolError::InvalidArguments(format!(
            "{} must be a date in YYYY-MM-DD format, got {}",
            field, value
        ))
    })
}

pub fn parse_time(value: &str, field: &str) -> Result<NaiveTime, ToolError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        ToolError::InvalidArguments(format!(
            "{} must be a time in HH:MM format, got {}",
            field, value
        ))
    })
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub fn parse_email(value: &str, field: &str) -> Result<String, ToolError> {
    if EMAIL_RE.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(ToolError::InvalidArguments(format!(
            "{} is not a valid email address: {}",
            field, value
        )))
    }
}

/// Either an `event_id`, or a `patient_name` with `date` and an
/// optional `time` to look the appointment up by.
pub fn parse_target(
    event_id: &Option<String>,
    patient_name: &Option<String>,
    date: &Option<String>,
    time: &Option<String>,
) -> Result<AppointmentTarget, ToolError> {
    if let Some(event_id) = optional(event_id) {
        return Ok(AppointmentTarget::ById(event_id.to_string()));
    }

    let Some(patient_name) = optional(patient_name) else {
        return Err(ToolError::InvalidArguments(String::from(
            "Either event_id or patient_name and date are required",
        )));
    };
    let date = required(date, "date")?;

    Ok(AppointmentTarget::ByPatient {
        patient_name: patient_name.to_string(),
        date: parse_date(date, "date")?,
        time: optional(time).map(|t| parse_time(t, "time")).transpose()?,
    })
}

pub fn to_value<T: Serialize>(reply: &T) -> Result<Value, ToolError> {
    serde_json::to_value(reply).map_err(|e| ToolError::External(e.into()))
}
