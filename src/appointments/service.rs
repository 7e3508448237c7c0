use std::sync::Arc;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde_json::json;

use super::audit::{self, AuditNote};
use super::matcher::{MatchOutcome, find_appointment};
use super::models::{
    AppointmentDetails, AppointmentList, AppointmentSummary, AppointmentTarget,
    AvailabilityReport, Booking, BookingConfirmation, CancelOutcome, LookupFailure,
    RescheduleOutcome,
};
use super::slots::{BusinessHours, find_available_slots, resolve_local, start_of_day};
use crate::core::AppConfig;
use crate::google::{Attendee, CalendarApi, Event, EventDateTime, ReminderOverride, Reminders};

/// Appointment operations for one clinic calendar.
///
/// Holds no state of its own: every call reads the calendar and at most
/// one write goes back to it.
pub struct Clinic {
    calendar: Arc<dyn CalendarApi>,
    timezone: Tz,
    hours: BusinessHours,
}

impl Clinic {
    pub fn new(calendar: Arc<dyn CalendarApi>, timezone: Tz, hours: BusinessHours) -> Self {
        Self {
            calendar,
            timezone,
            hours,
        }
    }

    pub fn from_config(calendar: Arc<dyn CalendarApi>, config: &AppConfig) -> Self {
        Self::new(calendar, config.timezone, config.business_hours)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn business_hours(&self) -> &BusinessHours {
        &self.hours
    }

    fn local(&self, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>> {
        resolve_local(self.timezone, date.and_time(time)).ok_or_else(|| {
            anyhow!(
                "{} {} does not exist in {}",
                date,
                time.format("%H:%M"),
                self.timezone
            )
        })
    }

    async fn business_day_events(&self, date: NaiveDate) -> Result<Vec<Event>> {
        let (start, end) = self.hours.window(date, self.timezone)?;
        self.calendar
            .list_events(start.with_timezone(&Utc), end.with_timezone(&Utc))
            .await
    }

    async fn whole_day_events(&self, date: NaiveDate) -> Result<Vec<Event>> {
        let start = start_of_day(self.timezone, date);
        let end = start_of_day(self.timezone, date + Duration::days(1));
        self.calendar
            .list_events(start.with_timezone(&Utc), end.with_timezone(&Utc))
            .await
    }

    pub async fn available_slots(&self, date: NaiveDate) -> Result<AvailabilityReport> {
        let events = self.business_day_events(date).await?;
        let available_slots = find_available_slots(date, &self.hours, &events, self.timezone);
        tracing::debug!(
            "{} of {} slots free on {}",
            available_slots.len(),
            self.hours.slot_starts().len(),
            date
        );

        Ok(AvailabilityReport {
            date: date.to_string(),
            available_slots,
            business_hours: self.hours.label(),
        })
    }

    /// Create the appointment. Availability is not checked again here,
    /// two bookings racing for the same slot both land on the calendar.
    pub async fn book(&self, booking: &Booking) -> Result<BookingConfirmation> {
        let start = self.local(booking.date, booking.time)?;
        let end = start + self.hours.slot_length();
        let zone = self.timezone.name();

        let mut description = format!(
            "Type: {}\nPatiënt: {}\nEmail: {}",
            booking.appointment_type, booking.patient_name, booking.patient_email
        );
        if let Some(phone) = &booking.patient_phone {
            description.push_str(&format!("\nTelefoon: {}", phone));
        }

        let event = Event {
            summary: Some(format!("Afspraak - {}", booking.patient_name)),
            description: Some(description),
            start: EventDateTime::timed(start.fixed_offset(), zone),
            end: EventDateTime::timed(end.fixed_offset(), zone),
            attendees: vec![Attendee {
                email: booking.patient_email.clone(),
                display_name: Some(booking.patient_name.clone()),
                ..Default::default()
            }],
            reminders: Some(Reminders {
                use_default: false,
                overrides: vec![
                    ReminderOverride {
                        method: String::from("email"),
                        minutes: 24 * 60,
                    },
                    ReminderOverride {
                        method: String::from("popup"),
                        minutes: 30,
                    },
                ],
            }),
            ..Default::default()
        };

        let created = self.calendar.insert_event(&event).await?;
        let event_id = created.id().to_string();
        tracing::info!("Booked appointment {} at {}", event_id, start.to_rfc3339());

        Ok(BookingConfirmation {
            success: true,
            message: format!(
                "Afspraak geboekt voor {} op {} om {}",
                booking.patient_name,
                booking.date,
                booking.time.format("%H:%M")
            ),
            event_id,
            event: created,
        })
    }

    /// Timed appointments from the start of `start_date` through the end
    /// of `end_date`.
    pub async fn list(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<AppointmentList> {
        let start = start_of_day(self.timezone, start_date);
        let end = start_of_day(self.timezone, end_date + Duration::days(1));
        let events = self
            .calendar
            .list_events(start.with_timezone(&Utc), end.with_timezone(&Utc))
            .await?;

        let appointments: Vec<AppointmentSummary> = events
            .iter()
            .filter(|event| event.start.date_time.is_some())
            .map(AppointmentSummary::from)
            .collect();

        Ok(AppointmentList {
            count: appointments.len(),
            appointments,
        })
    }

    pub async fn details(&self, event_id: &str) -> Result<AppointmentDetails> {
        let event = self.calendar.get_event(event_id).await?;

        Ok(AppointmentDetails {
            id: event.id().to_string(),
            summary: event.summary().to_string(),
            cancelled: audit::is_cancelled(event.summary()),
            audit_notes: AuditNote::parse_all(event.description()),
            description: event.description().to_string(),
            status: event.status.clone().unwrap_or_default(),
            start: event.start,
            end: event.end,
            attendees: event.attendees,
        })
    }

    /// Resolve a target to a single event. Lookups by patient that find
    /// nothing or more than one event come back as a `LookupFailure`.
    async fn resolve(&self, target: &AppointmentTarget) -> Result<Result<Event, LookupFailure>> {
        let (patient_name, date, time) = match target {
            AppointmentTarget::ById(event_id) => {
                return Ok(Ok(self.calendar.get_event(event_id).await?));
            }
            AppointmentTarget::ByPatient {
                patient_name,
                date,
                time,
            } => (patient_name, *date, *time),
        };

        let events = self.whole_day_events(date).await?;
        let at = time
            .map(|t| format!(" om {}", t.format("%H:%M")))
            .unwrap_or_default();

        let resolved = match find_appointment(patient_name, date, time, &events, self.timezone) {
            MatchOutcome::Single(event) => Ok(event),
            MatchOutcome::NotFound => Err(LookupFailure::NotFound {
                message: format!(
                    "Geen afspraak gevonden voor {} op {}{}",
                    patient_name, date, at
                ),
            }),
            MatchOutcome::Multiple(events) => {
                let candidates: Vec<AppointmentSummary> =
                    events.iter().map(AppointmentSummary::from).collect();
                Err(LookupFailure::MultipleMatches {
                    count: candidates.len(),
                    first: candidates[0].clone(),
                    message: format!(
                        "Meerdere afspraken gevonden voor {} op {}{}. Geef een tijd of afspraak-id op.",
                        patient_name, date, at
                    ),
                    candidates,
                })
            }
        };
        Ok(resolved)
    }

    /// Mark the appointment cancelled. The event is never deleted: the
    /// title gets the cancelled marker and the reason is appended to
    /// the description as an audit note.
    pub async fn cancel(&self, target: &AppointmentTarget, reason: &str) -> Result<CancelOutcome> {
        let mut event = match self.resolve(target).await? {
            Ok(event) => event,
            Err(failure) => return Ok(failure.into()),
        };
        let event_id = event.id().to_string();

        if audit::is_cancelled(event.summary()) {
            return Ok(CancelOutcome::AlreadyCancelled {
                message: format!("Afspraak {} is al geannuleerd", event_id),
                event_id,
            });
        }

        let reason = audit::normalize_reason(reason);
        let note = AuditNote::Cancelled {
            reason: reason.clone(),
        };
        event.summary = Some(audit::mark_cancelled(event.summary()));
        event.description = Some(note.append_to(event.description()));
        self.calendar.update_event(&event_id, &event).await?;
        tracing::info!("Cancelled appointment {}", event_id);

        Ok(CancelOutcome::Cancelled {
            message: format!("Afspraak {} is geannuleerd", event_id),
            event_id,
            reason,
        })
    }

    /// Move the appointment to `new_date` at `new_time` if that slot is
    /// free, otherwise report the free times of that day.
    pub async fn reschedule(
        &self,
        target: &AppointmentTarget,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> Result<RescheduleOutcome> {
        let event = match self.resolve(target).await? {
            Ok(event) => event,
            Err(failure) => return Ok(failure.into()),
        };
        let event_id = event.id().to_string();

        if audit::is_cancelled(event.summary()) {
            return Ok(RescheduleOutcome::AppointmentCancelled {
                message: format!(
                    "Afspraak {} is geannuleerd en kan niet worden verzet",
                    event_id
                ),
                event_id,
            });
        }

        // The appointment itself must not block its own new slot
        let events = self.business_day_events(new_date).await?;
        let free = find_available_slots(
            new_date,
            &self.hours,
            events.iter().filter(|e| e.id() != event_id),
            self.timezone,
        );
        if !free.iter().any(|slot| slot.time == new_time) {
            tracing::info!(
                "Refused to move {} to {} {}: slot not free",
                event_id,
                new_date,
                new_time.format("%H:%M")
            );
            return Ok(RescheduleOutcome::NotAvailable {
                message: format!(
                    "Het tijdstip {} op {} is niet beschikbaar",
                    new_time.format("%H:%M"),
                    new_date
                ),
                event_id,
                available_times: free
                    .iter()
                    .map(|slot| slot.time.format("%H:%M").to_string())
                    .collect(),
            });
        }

        let new_start = self.local(new_date, new_time)?;
        let new_end = new_start + self.hours.slot_length();
        let zone = self.timezone.name();

        let previous = event
            .start
            .date_time
            .map(|start| start.with_timezone(&self.timezone).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| String::from("onbekend"));
        let note = AuditNote::rescheduled(
            &previous,
            &new_start.format("%Y-%m-%d %H:%M").to_string(),
        );

        let patch = json!({
            "start": EventDateTime::timed(new_start.fixed_offset(), zone),
            "end": EventDateTime::timed(new_end.fixed_offset(), zone),
            "description": note.append_to(event.description()),
        });
        self.calendar.patch_event(&event_id, &patch).await?;
        tracing::info!("Rescheduled appointment {} to {}", event_id, new_start.to_rfc3339());

        Ok(RescheduleOutcome::Rescheduled {
            message: format!(
                "Afspraak {} is verzet naar {} om {}",
                event_id,
                new_date,
                new_time.format("%H:%M")
            ),
            event_id,
            new_start: new_start.fixed_offset().to_rfc3339(),
            new_end: new_end.fixed_offset().to_rfc3339(),
        })
    }
}
