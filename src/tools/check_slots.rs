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
pub struct CheckAvailableSlotsProps {
    pub date: Property,
}

#[derive(Deserialize)]
pub struct CheckAvailableSlotsArgs {
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct CheckAvailableSlotsTool {
    #[serde(flatten)]
    pub definition: ToolDefinition<CheckAvailableSlotsProps>,
    #[serde(skip)]
    clinic: Arc<Clinic>,
}

#[async_trait]
impl ToolCall for CheckAvailableSlotsTool {
    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: CheckAvailableSlotsArgs = parse_args(args)?;
        let date = parse_date(required(&args.date, "date")?, "date")?;

        let report = self.clinic.available_slots(date).await?;
        to_value(&report)
    }

    fn function_name(&self) -> String {
        self.definition.name.clone()
    }
}

impl CheckAvailableSlotsTool {
    pub fn new(clinic: Arc<Clinic>) -> Self {
        let definition = ToolDefinition {
            name: String::from("check_available_slots"),
            description: String::from("Check available appointment slots for a specific date"),
            input_schema: InputSchema::object(
                CheckAvailableSlotsProps {
                    date: Property::string("Date in YYYY-MM-DD format"),
                },
                &["date"],
            ),
        };
        Self { definition, clinic }
    }
}
