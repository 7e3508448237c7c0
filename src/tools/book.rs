use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    InputSchema, Property, ToolCall, ToolDefinition, ToolError, optional, parse_args, parse_date,
    parse_email, parse_time, required, to_value,
};
use crate::appointments::{Booking, Clinic};

#[derive(Serialize)]
pub struct BookAppointmentProps {
    pub patient_name: Property,
    pub patient_email: Property,
    pub patient_phone: Property,
    pub date: Property,
    pub time: Property,
    pub appointment_type: Property,
}

#[derive(Deserialize)]
pub struct BookAppointmentArgs {
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub appointment_type: Option<String>,
}

#[derive(Serialize)]
pub struct BookAppointmentTool {
    #[serde(flatten)]
    pub definition: ToolDefinition<BookAppointmentProps>,
    #[serde(skip)]
    clinic: Arc<Clinic>,
}

impl BookAppointmentTool {
    pub fn new(clinic: Arc<Clinic>) -> Self {
        let definition = ToolDefinition {
            name: String::from("book_appointment"),
            description: String::from("Book a new appointment"),
            input_schema: InputSchema::object(
                BookAppointmentProps {
                    patient_name: Property::string("Full name of the patient"),
                    patient_email: Property::string("Email address of the patient"),
                    patient_phone: Property::string("Phone number of the patient (optional)"),
                    date: Property::string("Date in YYYY-MM-DD format"),
                    time: Property::string("Start time in HH:MM format, on a slot boundary"),
                    appointment_type: Property::string(
                        "Kind of appointment, e.g. controle or gebitsreiniging",
                    ),
                },
                &[
                    "patient_name",
                    "patient_email",
                    "date",
                    "time",
                    "appointment_type",
                ],
            ),
        };
        Self { definition, clinic }
    }

    fn booking(&self, args: &BookAppointmentArgs) -> Result<Booking, ToolError> {
        let patient_name = required(&args.patient_name, "patient_name")?;
        let patient_email = required(&args.patient_email, "patient_email")?;
        let date = required(&args.date, "date")?;
        let time = required(&args.time, "time")?;
        let appointment_type = required(&args.appointment_type, "appointment_type")?;

        let time = parse_time(time, "time")?;
        let hours = self.clinic.business_hours();
        if !hours.contains_slot(time) {
            return Err(ToolError::InvalidArguments(format!(
                "time {} is not a slot start within business hours {} ({} minute slots)",
                time.format("%H:%M"),
                hours.label(),
                hours.slot_minutes
            )));
        }

        Ok(Booking {
            patient_name: patient_name.to_string(),
            patient_email: parse_email(patient_email, "patient_email")?,
            patient_phone: optional(&args.patient_phone).map(str::to_string),
            date: parse_date(date, "date")?,
            time,
            appointment_type: appointment_type.to_string(),
        })
    }
}

#[async_trait]
impl ToolCall for BookAppointmentTool {
    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: BookAppointmentArgs = parse_args(args)?;
        let booking = self.booking(&args)?;

        let confirmation = self.clinic.book(&booking).await?;
        to_value(&confirmation)
    }

    fn function_name(&self) -> String {
        self.definition.name.clone()
    }
}
