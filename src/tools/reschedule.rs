use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    InputSchema, Property, ToolCall, ToolDefinition, ToolError, parse_args, parse_date,
    parse_target, parse_time, required, to_value,
};
use crate::appointments::{Clinic, Reply};

#[derive(Serialize)]
pub struct RescheduleAppointmentProps {
    pub event_id: Property,
    pub patient_name: Property,
    pub date: Property,
    pub time: Property,
    pub new_date: Property,
    pub new_time: Property,
}

#[derive(Deserialize)]
pub struct RescheduleAppointmentArgs {
    pub event_id: Option<String>,
    pub patient_name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub new_date: Option<String>,
    pub new_time: Option<String>,
}

#[derive(Serialize)]
pub struct RescheduleAppointmentTool {
    #[serde(flatten)]
    pub definition: ToolDefinition<RescheduleAppointmentProps>,
    #[serde(skip)]
    clinic: Arc<Clinic>,
}

#[async_trait]
impl ToolCall for RescheduleAppointmentTool {
    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: RescheduleAppointmentArgs = parse_args(args)?;
        let new_date = parse_date(required(&args.new_date, "new_date")?, "new_date")?;
        let new_time = parse_time(required(&args.new_time, "new_time")?, "new_time")?;
        let target = parse_target(&args.event_id, &args.patient_name, &args.date, &args.time)?;

        let outcome = self.clinic.reschedule(&target, new_date, new_time).await?;
        to_value(&Reply {
            success: outcome.is_success(),
            outcome,
        })
    }

    fn function_name(&self) -> String {
        self.definition.name.clone()
    }
}

impl RescheduleAppointmentTool {
    pub fn new(clinic: Arc<Clinic>) -> Self {
        let definition = ToolDefinition {
            name: String::from("reschedule_appointment"),
            description: String::from(
                "Reschedule an appointment to a free slot, either by event_id or by patient_name and date (and optionally time)",
            ),
            input_schema: InputSchema::object(
                RescheduleAppointmentProps {
                    event_id: Property::string("The calendar event ID of the appointment"),
                    patient_name: Property::string("Patient name to look the appointment up by"),
                    date: Property::string("Current date of the appointment in YYYY-MM-DD format"),
                    time: Property::string("Current start time of the appointment in HH:MM format"),
                    new_date: Property::string("New date in YYYY-MM-DD format"),
                    new_time: Property::string("New start time in HH:MM format"),
                },
                &["new_date", "new_time"],
            ),
        };
        Self { definition, clinic }
    }
}
