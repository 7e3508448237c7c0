use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;

use crate::appointments::Clinic;
use crate::core::AppConfig;
use crate::google::{GoogleAuth, GoogleCalendar};

pub async fn run(config: &AppConfig, date: NaiveDate) -> Result<()> {
    let auth = Arc::new(GoogleAuth::from_config(config));
    let calendar = Arc::new(GoogleCalendar::new(
        &config.google_api_url,
        &config.calendar_id,
        auth,
    ));
    let clinic = Clinic::from_config(calendar, config);

    let report = clinic.available_slots(date).await?;
    println!("{} ({})", report.date, report.business_hours);
    if report.available_slots.is_empty() {
        println!("No free slots");
    }
    for slot in report.available_slots {
        println!("{}", slot.time.format("%H:%M"));
    }
    Ok(())
}
