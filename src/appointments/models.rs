use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::audit::AuditNote;
use super::slots::Slot;
use crate::google::{Attendee, Event, EventDateTime};

/// A validated booking request
#[derive(Debug, Clone)]
pub struct Booking {
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub appointment_type: String,
}

/// Which appointment a cancel or reschedule applies to
#[derive(Debug, Clone, PartialEq)]
pub enum AppointmentTarget {
    ById(String),
    ByPatient {
        patient_name: String,
        date: NaiveDate,
        time: Option<NaiveTime>,
    },
}

#[derive(Debug, Serialize)]
pub struct AvailabilityReport {
    pub date: String,
    pub available_slots: Vec<Slot>,
    pub business_hours: String,
}

#[derive(Debug, Serialize)]
pub struct BookingConfirmation {
    pub success: bool,
    pub event_id: String,
    pub message: String,
    pub event: Event,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub id: String,
    pub summary: String,
    pub start: String,
    pub end: String,
    pub description: String,
    pub attendees: Vec<Attendee>,
}

fn rfc3339_or_date(at: &EventDateTime) -> String {
    match (at.date_time, at.date) {
        (Some(dt), _) => dt.to_rfc3339(),
        (None, Some(date)) => date.to_string(),
        (None, None) => String::new(),
    }
}

impl From<&Event> for AppointmentSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id().to_string(),
            summary: event.summary().to_string(),
            start: rfc3339_or_date(&event.start),
            end: rfc3339_or_date(&event.end),
            description: event.description().to_string(),
            attendees: event.attendees.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppointmentList {
    pub appointments: Vec<AppointmentSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct AppointmentDetails {
    pub id: String,
    pub summary: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub description: String,
    pub attendees: Vec<Attendee>,
    pub status: String,
    pub cancelled: bool,
    pub audit_notes: Vec<AuditNote>,
}

/// Why a patient lookup didn't resolve to exactly one appointment
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupFailure {
    NotFound {
        message: String,
    },
    MultipleMatches {
        count: usize,
        first: AppointmentSummary,
        candidates: Vec<AppointmentSummary>,
        message: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CancelOutcome {
    Cancelled {
        event_id: String,
        message: String,
        reason: String,
    },
    AlreadyCancelled {
        event_id: String,
        message: String,
    },
    NotFound {
        message: String,
    },
    MultipleMatches {
        count: usize,
        first: AppointmentSummary,
        candidates: Vec<AppointmentSummary>,
        message: String,
    },
}

impl CancelOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CancelOutcome::Cancelled { .. })
    }
}

impl From<LookupFailure> for CancelOutcome {
    fn from(failure: LookupFailure) -> Self {
        match failure {
            LookupFailure::NotFound { message } => CancelOutcome::NotFound { message },
            LookupFailure::MultipleMatches {
                count,
                first,
                candidates,
                message,
            } => CancelOutcome::MultipleMatches {
                count,
                first,
                candidates,
                message,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RescheduleOutcome {
    Rescheduled {
        event_id: String,
        message: String,
        new_start: String,
        new_end: String,
    },
    NotAvailable {
        event_id: String,
        message: String,
        available_times: Vec<String>,
    },
    AppointmentCancelled {
        event_id: String,
        message: String,
    },
    NotFound {
        message: String,
    },
    MultipleMatches {
        count: usize,
        first: AppointmentSummary,
        candidates: Vec<AppointmentSummary>,
        message: String,
    },
}

impl RescheduleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RescheduleOutcome::Rescheduled { .. })
    }
}

impl From<LookupFailure> for RescheduleOutcome {
    fn from(failure: LookupFailure) -> Self {
        match failure {
            LookupFailure::NotFound { message } => RescheduleOutcome::NotFound { message },
            LookupFailure::MultipleMatches {
                count,
                first,
                candidates,
                message,
            } => RescheduleOutcome::MultipleMatches {
                count,
                first,
                candidates,
                message,
            },
        }
    }
}

/// Tool replies carry a top level `success` flag next to the outcome
#[derive(Debug, Serialize)]
pub struct Reply<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: T,
}
