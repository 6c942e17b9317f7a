use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use shared_models::scheduling::TimeOfDay;

use crate::services::slots::SlotGenerator;

/// Calendar days scanned for the directory's "next available" annotation,
/// today included.
pub const LOOKAHEAD_DAYS: i64 = 7;

pub const NOT_AVAILABLE: &str = "Not Available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextSlot {
    pub date: NaiveDate,
    pub time: TimeOfDay,
    #[serde(skip)]
    today: NaiveDate,
}

impl NextSlot {
    /// "Today, 10:30", "Tomorrow, 09:00" or "Wed, 14:00".
    pub fn label(&self) -> String {
        match (self.date - self.today).num_days() {
            0 => format!("Today, {}", self.time),
            1 => format!("Tomorrow, {}", self.time),
            _ => format!("{}, {}", self.date.format("%a"), self.time),
        }
    }
}

/// Last date covered by the look-ahead window starting on `today`.
pub fn lookahead_end(today: NaiveDate) -> NaiveDate {
    today + Duration::days(LOOKAHEAD_DAYS - 1)
}

/// First open slot within the look-ahead window, if any.
pub fn find_next_available(generator: &SlotGenerator<'_>, now: NaiveDateTime) -> Option<NextSlot> {
    let today = now.date();
    generator
        .iter(today, lookahead_end(today), now)
        .next()
        .map(|slot| NextSlot {
            date: slot.date,
            time: slot.time,
            today,
        })
}

pub fn label_or_unavailable(next: Option<&NextSlot>) -> String {
    next.map(NextSlot::label).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
