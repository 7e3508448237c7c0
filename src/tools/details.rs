use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    InputSchema, Property, ToolCall, ToolDefinition, ToolError, parse_args, required, to_value,
};
use crate::appointments::Clinic;

#[derive(Serialize)]
pub struct GetAppointmentDetailsProps {
    pub event_id: Property,
}

#[derive(Deserialize)]
pub struct GetAppointmentDetailsArgs {
    pub event_id: Option<String>,
}

#[derive(Serialize)]
pub struct GetAppointmentDetailsTool {
    #[serde(flatten)]
    pub definition: ToolDefinition<GetAppointmentDetailsProps>,
    #[serde(skip)]
    clinic: Arc<Clinic>,
}

#[async_trait]
impl ToolCall for GetAppointmentDetailsTool {
    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: GetAppointmentDetailsArgs = parse_args(args)?;
        let event_id = required(&args.event_id, "event_id")?;

        let details = self.clinic.details(event_id).await?;
        to_value(&details)
    }

    fn function_name(&self) -> String {
        self.definition.name.clone()
    }
}

impl GetAppointmentDetailsTool {
    pub fn new(clinic: Arc<Clinic>) -> Self {
        let definition = ToolDefinition {
            name: String::from("get_appointment_details"),
            description: String::from("Get details of a specific appointment"),
            input_schema: InputSchema::object(
                GetAppointmentDetailsProps {
                    event_id: Property::string("The calendar event ID of the appointment"),
                },
                &["event_id"],
            ),
        };
        Self { definition, clinic }
    }
}
