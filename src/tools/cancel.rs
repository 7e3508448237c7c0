use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    InputSchema, Property, ToolCall, ToolDefinition, ToolError, optional, parse_args,
    parse_target, to_value,
};
use crate::appointments::{Clinic, Reply, audit::DEFAULT_CANCEL_REASON};

#[derive(Serialize)]
pub struct CancelAppointmentProps {
    pub event_id: Property,
    pub patient_name: Property,
    pub date: Property,
    pub time: Property,
    pub reason: Property,
}

#[derive(Deserialize)]
pub struct CancelAppointmentArgs {
    pub event_id: Option<String>,
    pub patient_name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct CancelAppointmentTool {
    #[serde(flatten)]
    pub definition: ToolDefinition<CancelAppointmentProps>,
    #[serde(skip)]
    clinic: Arc<Clinic>,
}

#[async_trait]
impl ToolCall for CancelAppointmentTool {
    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: CancelAppointmentArgs = parse_args(args)?;
        let target = parse_target(&args.event_id, &args.patient_name, &args.date, &args.time)?;
        let reason = optional(&args.reason).unwrap_or(DEFAULT_CANCEL_REASON);

        let outcome = self.clinic.cancel(&target, reason).await?;
        to_value(&Reply {
            success: outcome.is_success(),
            outcome,
        })
    }

    fn function_name(&self) -> String {
        self.definition.name.clone()
    }
}

impl CancelAppointmentTool {
    pub fn new(clinic: Arc<Clinic>) -> Self {
        let definition = ToolDefinition {
            name: String::from("cancel_appointment"),
            description: String::from(
                "Cancel an appointment, either by event_id or by patient_name and date (and optionally time)",
            ),
            input_schema: InputSchema::object(
                CancelAppointmentProps {
                    event_id: Property::string("The calendar event ID of the appointment"),
                    patient_name: Property::string("Patient name to look the appointment up by"),
                    date: Property::string("Date of the appointment in YYYY-MM-DD format"),
                    time: Property::string("Start time of the appointment in HH:MM format"),
                    reason: Property::string("Reason for the cancellation"),
                },
                &[],
            ),
        };
        Self { definition, clinic }
    }
}
