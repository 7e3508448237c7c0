//! Find a patient's appointment among a day's events.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::google::Event;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    NotFound,
    Single(Event),
    /// More than one event fits. Callers must ask which one is meant
    /// rather than act on any of them.
    Multiple(Vec<Event>),
}

impl MatchOutcome {
    pub fn count(&self) -> usize {
        match self {
            MatchOutcome::NotFound => 0,
            MatchOutcome::Single(_) => 1,
            MatchOutcome::Multiple(events) => events.len(),
        }
    }
}

fn mentions_patient(event: &Event, needle: &str) -> bool {
    if event.summary().to_lowercase().contains(needle) {
        return true;
    }
    event.attendees.iter().any(|attendee| {
        attendee.email.to_lowercase().contains(needle)
            || attendee
                .display_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(needle))
    })
}

fn starts_on(event: &Event, date: NaiveDate, tz: Tz) -> bool {
    match (event.start.date_time, event.start.date) {
        (Some(start), _) => start.with_timezone(&tz).date_naive() == date,
        (None, Some(start_date)) => start_date == date,
        (None, None) => false,
    }
}

fn starts_at(event: &Event, time: NaiveTime, tz: Tz) -> bool {
    let target = time.format("%H:%M").to_string();
    event
        .start
        .date_time
        .is_some_and(|start| start.with_timezone(&tz).format("%H:%M").to_string() == target)
}

/// Look up the appointment of `patient_name` on `date`.
///
/// An event is a candidate when the lower cased name is a substring of
/// its title or of any attendee's email or display name. With `time`
/// given, only candidates starting at exactly that local `HH:MM` are
/// kept; all-day events never match a time.
pub fn find_appointment(
    patient_name: &str,
    date: NaiveDate,
    time: Option<NaiveTime>,
    events: &[Event],
    tz: Tz,
) -> MatchOutcome {
    let needle = patient_name.trim().to_lowercase();

    let mut candidates: Vec<Event> = events
        .iter()
        .filter(|event| starts_on(event, date, tz))
        .filter(|event| mentions_patient(event, &needle))
        .filter(|event| time.is_none_or(|t| starts_at(event, t, tz)))
        .cloned()
        .collect();

    match candidates.len() {
        0 => MatchOutcome::NotFound,
        1 => MatchOutcome::Single(candidates.remove(0)),
        _ => MatchOutcome::Multiple(candidates),
    }
}
