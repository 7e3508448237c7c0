//! Appointment scheduling on top of the clinic calendar

pub mod audit;
pub mod matcher;
pub mod models;
pub mod service;
pub mod slots;

pub use audit::AuditNote;
pub use matcher::{MatchOutcome, find_appointment};
pub use models::{AppointmentTarget, Booking, Reply};
pub use service::Clinic;
pub use slots::{BusinessHours, Slot, find_available_slots};
