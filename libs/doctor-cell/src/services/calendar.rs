use chrono::{Datelike, NaiveDate};
use tracing::warn;
use uuid::Uuid;

use shared_models::scheduling::{TimeOfDay, WorkingHours};

/// Half-open `[start, end)` window a doctor accepts appointments in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Day of week counted from Sunday = 0, matching the directory's rows.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// A doctor's recurring weekly availability.
///
/// At most one window per weekday. When the directory lists several rows for
/// the same day, the one starting earliest wins (then the one ending
/// earliest), so lookups stay deterministic regardless of row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingHoursCalendar {
    doctor_id: Uuid,
    windows: [Option<WorkingWindow>; 7],
}

impl WorkingHoursCalendar {
    pub fn from_working_hours(doctor_id: Uuid, hours: &[WorkingHours]) -> Self {
        let mut windows: [Option<WorkingWindow>; 7] = [None; 7];

        for entry in hours.iter().filter(|h| h.doctor_id == doctor_id) {
            if entry.day_of_week > 6 || entry.start_time >= entry.end_time {
                warn!(
                    "Ignoring invalid working hours for doctor {}: day {} {}-{}",
                    doctor_id, entry.day_of_week, entry.start_time, entry.end_time
                );
                continue;
            }

            let candidate = WorkingWindow {
                start: entry.start_time,
                end: entry.end_time,
            };
            let slot = &mut windows[entry.day_of_week as usize];

            if let Some(current) = slot.as_mut() {
                warn!(
                    "Doctor {} has several working windows on day {} ({}-{} and {}-{}), using the earliest",
                    doctor_id,
                    entry.day_of_week,
                    current.start,
                    current.end,
                    candidate.start,
                    candidate.end
                );
                if (candidate.start, candidate.end) < (current.start, current.end) {
                    *current = candidate;
                }
            } else {
                *slot = Some(candidate);
            }
        }

        Self { doctor_id, windows }
    }

    pub fn doctor_id(&self) -> Uuid {
        self.doctor_id
    }

    pub fn window_for(&self, doctor_id: Uuid, day_of_week: u8) -> Option<WorkingWindow> {
        if doctor_id != self.doctor_id {
            return None;
        }
        self.windows.get(day_of_week as usize).copied().flatten()
    }

    pub fn window_on(&self, date: NaiveDate) -> Option<WorkingWindow> {
        self.window_for(self.doctor_id, day_of_week(date))
    }

    pub fn is_empty(&self) -> bool {
        self.windows.iter().all(Option::is_none)
    }
}
