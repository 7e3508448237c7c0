//! Cancellation and reschedule notes kept in the event itself.
//!
//! The calendar is shared with the front desk who read it directly, so
//! a cancelled appointment stays on the calendar with a marked title
//! and the history is written as lines at the end of the description.
//! Notes are only ever appended.

use serde::Serialize;

pub const CANCELLED_PREFIX: &str = "[GEANNULEERD]";
pub const DEFAULT_CANCEL_REASON: &str = "Geannuleerd door patiënt";

const CANCELLED_LABEL: &str = "Reden annulering: ";
const RESCHEDULED_LABEL: &str = "Verzet: ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditNote {
    Cancelled { reason: String },
    Rescheduled { from: String, to: String },
}

// Every note is exactly one line of the description
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cancellation reason as it will be recorded, with the default for a
/// blank reason.
pub fn normalize_reason(reason: &str) -> String {
    let reason = single_line(reason);
    if reason.is_empty() {
        DEFAULT_CANCEL_REASON.to_string()
    } else {
        reason
    }
}

impl AuditNote {
    pub fn cancelled(reason: &str) -> Self {
        AuditNote::Cancelled {
            reason: normalize_reason(reason),
        }
    }

    pub fn rescheduled(from: &str, to: &str) -> Self {
        AuditNote::Rescheduled {
            from: single_line(from),
            to: single_line(to),
        }
    }

    pub fn render(&self) -> String {
        match self {
            AuditNote::Cancelled { reason } => format!("{}{}", CANCELLED_LABEL, reason),
            AuditNote::Rescheduled { from, to } => {
                format!("{}{} -> {}", RESCHEDULED_LABEL, from, to)
            }
        }
    }

    /// The description with this note added after any existing text.
    pub fn append_to(&self, description: &str) -> String {
        let existing = description.trim_end();
        if existing.is_empty() {
            self.render()
        } else {
            format!("{}\n\n{}", existing, self.render())
        }
    }

    fn parse_line(line: &str) -> Option<Self> {
        if let Some(reason) = line.strip_prefix(CANCELLED_LABEL) {
            return Some(AuditNote::Cancelled {
                reason: reason.trim().to_string(),
            });
        }
        let moved = line.strip_prefix(RESCHEDULED_LABEL)?;
        let (from, to) = moved.split_once(" -> ")?;
        Some(AuditNote::Rescheduled {
            from: from.trim().to_string(),
            to: to.trim().to_string(),
        })
    }

    /// All notes found in a description, oldest first.
    pub fn parse_all(description: &str) -> Vec<Self> {
        description
            .lines()
            .filter_map(|line| Self::parse_line(line.trim()))
            .collect()
    }
}

pub fn is_cancelled(summary: &str) -> bool {
    summary.trim_start().starts_with(CANCELLED_PREFIX)
}

/// Title with the cancelled marker, added at most once.
pub fn mark_cancelled(summary: &str) -> String {
    if is_cancelled(summary) {
        summary.to_string()
    } else {
        format!("{} {}", CANCELLED_PREFIX, summary)
    }
}
