//! Free slot computation for a single clinic day.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::google::Event;

/// The daily window appointments can be booked in and the fixed
/// length of each appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub slot_minutes: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            slot_minutes: 30,
        }
    }
}

impl BusinessHours {
    pub fn new(start: NaiveTime, end: NaiveTime, slot_minutes: u32) -> Result<Self> {
        if slot_minutes == 0 {
            bail!("Slot length must be at least one minute");
        }
        if start >= end {
            bail!(
                "Business hours start {} must be before end {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            );
        }
        Ok(Self {
            start,
            end,
            slot_minutes,
        })
    }

    pub fn slot_length(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_minutes))
    }

    /// Candidate slot starts, in order. A trailing slot that would run
    /// past the end of the window is left out.
    pub fn slot_starts(&self) -> Vec<NaiveTime> {
        let mut starts = Vec::new();
        let mut current = self.start;
        while current < self.end {
            let (slot_end, wrapped) = current.overflowing_add_signed(self.slot_length());
            if wrapped != 0 || slot_end > self.end {
                break;
            }
            starts.push(current);
            current = slot_end;
        }
        starts
    }

    /// Whether `time` is the start of one of the day's slots.
    pub fn contains_slot(&self, time: NaiveTime) -> bool {
        self.slot_starts().contains(&time)
    }

    /// The business-hours window of `date` as instants in the clinic zone.
    pub fn window(&self, date: NaiveDate, tz: Tz) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
        let start = resolve_local(tz, date.and_time(self.start))
            .ok_or_else(|| anyhow!("{} {} does not exist in {}", date, self.start, tz))?;
        let end = resolve_local(tz, date.and_time(self.end))
            .ok_or_else(|| anyhow!("{} {} does not exist in {}", date, self.end, tz))?;
        Ok((start, end))
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Map a wall-clock time in the clinic zone to an instant. Times that
/// fall in a DST gap don't exist and yield `None`, times in a DST fold
/// resolve to the earlier instant.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest()
}

/// Midnight at the start of `date` in the clinic zone.
pub fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    resolve_local(tz, midnight).unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

/// Interval an event keeps busy, as a half open `[start, end)` range.
/// All-day events occupy their whole (end exclusive) date range in the
/// clinic zone.
pub fn busy_interval(event: &Event, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if let (Some(start), Some(end)) = (event.start.date_time, event.end.date_time) {
        return Some((start.with_timezone(&Utc), end.with_timezone(&Utc)));
    }
    if let Some(start_date) = event.start.date {
        let end_date = event
            .end
            .date
            .filter(|end| *end > start_date)
            .unwrap_or_else(|| start_date + Duration::days(1));
        return Some((
            start_of_day(tz, start_date).with_timezone(&Utc),
            start_of_day(tz, end_date).with_timezone(&Utc),
        ));
    }
    None
}

fn serialize_hhmm<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format("%H:%M"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    #[serde(serialize_with = "serialize_hhmm")]
    pub time: NaiveTime,
    pub datetime: DateTime<FixedOffset>,
}

/// Free slots of `date` given the events already on the calendar.
///
/// A slot `[s, s + len)` is free when no event `[a, b)` satisfies
/// `s < b && s + len > a`, so back to back appointments don't
/// conflict. Slots are returned in chronological order and a fully
/// booked day is just an empty list.
pub fn find_available_slots<'a>(
    date: NaiveDate,
    hours: &BusinessHours,
    events: impl IntoIterator<Item = &'a Event>,
    tz: Tz,
) -> Vec<Slot> {
    let busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = events
        .into_iter()
        .filter_map(|event| {
            let interval = busy_interval(event, tz);
            if interval.is_none() {
                tracing::warn!(
                    "Ignoring event {} without a usable start/end",
                    event.id()
                );
            }
            interval
        })
        .collect();

    hours
        .slot_starts()
        .into_iter()
        .filter_map(|time| {
            let Some(start) = resolve_local(tz, date.and_time(time)) else {
                tracing::debug!("Skipping {} {} which doesn't exist in {}", date, time, tz);
                return None;
            };
            let slot_start = start.with_timezone(&Utc);
            let slot_end = slot_start + hours.slot_length();
            let conflict = busy
                .iter()
                .any(|(busy_start, busy_end)| slot_start < *busy_end && slot_end > *busy_start);
            if conflict {
                None
            } else {
                Some(Slot {
                    time,
                    datetime: start.fixed_offset(),
                })
            }
        })
        .collect()
}
