pub mod gcal;
pub mod oauth;

pub use gcal::{Attendee, CalendarApi, Event, EventDateTime, GoogleCalendar, ReminderOverride, Reminders};
pub use oauth::GoogleAuth;
