use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    InputSchema, Property, ToolCall, ToolDefinition, ToolError, parse_args, parse_date, required,
    to_value,
};
use crate::appointments::Clinic;

#[derive(Serialize)]
pub struct ListAppointmentsProps {
    pub start_date: Property,
    pub end_date: Property,
}

#[derive(Deserialize)]
pub struct ListAppointmentsArgs {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Serialize)]
pub struct ListAppointmentsTool {
    #[serde(flatten)]
    pub definition: ToolDefinition<ListAppointmentsProps>,
    #[serde(skip)]
    clinic: Arc<Clinic>,
}

#[async_trait]
impl ToolCall for ListAppointmentsTool {
    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: ListAppointmentsArgs = parse_args(args)?;
        let start_date = parse_date(required(&args.start_date, "start_date")?, "start_date")?;
        let end_date = parse_date(required(&args.end_date, "end_date")?, "end_date")?;
        if end_date < start_date {
            return Err(ToolError::InvalidArguments(format!(
                "end_date {} is before start_date {}",
                end_date, start_date
            )));
        }

        let list = self.clinic.list(start_date, end_date).await?;
        to_value(&list)
    }

    fn function_name(&self) -> String {
        self.definition.name.clone()
    }
}

impl ListAppointmentsTool {
    pub fn new(clinic: Arc<Clinic>) -> Self {
        let definition = ToolDefinition {
            name: String::from("list_appointments"),
            description: String::from("List appointments in a date range"),
            input_schema: InputSchema::object(
                ListAppointmentsProps {
                    start_date: Property::string("First day of the range in YYYY-MM-DD format"),
                    end_date: Property::string(
                        "Last day of the range in YYYY-MM-DD format (inclusive)",
                    ),
                },
                &["start_date", "end_date"],
            ),
        };
        Self { definition, clinic }
    }
}
