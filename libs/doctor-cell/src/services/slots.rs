use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};

use shared_models::scheduling::{Slot, SlotKey, TimeOfDay, SLOT_MINUTES};

use crate::services::calendar::WorkingHoursCalendar;

/// Derives open slots from a doctor's weekly calendar and a snapshot of the
/// CONFIRMED appointments holding slots.
///
/// Pure: the same calendar, snapshot, range and `now` always give the same
/// slots. The snapshot is advisory, a slot shown here can still be lost to a
/// concurrent claim.
pub struct SlotGenerator<'a> {
    calendar: &'a WorkingHoursCalendar,
    booked: HashSet<(NaiveDate, TimeOfDay)>,
    granularity: u16,
}

impl<'a> SlotGenerator<'a> {
    pub fn new(calendar: &'a WorkingHoursCalendar, booked: impl IntoIterator<Item = SlotKey>) -> Self {
        let doctor_id = calendar.doctor_id();
        let booked = booked
            .into_iter()
            .filter(|key| key.doctor_id == doctor_id)
            .map(|key| (key.date, key.start_time))
            .collect();

        Self {
            calendar,
            booked,
            granularity: SLOT_MINUTES,
        }
    }

    /// Open slots in `[from, to]`, date-ascending then time-ascending.
    pub fn generate(&self, from: NaiveDate, to: NaiveDate, now: NaiveDateTime) -> Vec<Slot> {
        self.iter(from, to, now).collect()
    }

    /// Lazy form of [`generate`](Self::generate), one day at a time.
    pub fn iter(
        &'a self,
        from: NaiveDate,
        to: NaiveDate,
        now: NaiveDateTime,
    ) -> impl Iterator<Item = Slot> + 'a {
        from.iter_days()
            .take_while(move |date| *date <= to)
            .flat_map(move |date| self.slots_on(date, now))
    }

    fn slots_on(&self, date: NaiveDate, now: NaiveDateTime) -> Vec<Slot> {
        let Some(window) = self.calendar.window_on(date) else {
            return Vec::new();
        };

        let mut cursor = window.start;
        if date == now.date() {
            cursor = cursor.max(TimeOfDay::boundary_at_or_after(now.time(), self.granularity));
        }

        let mut slots = Vec::new();
        while cursor < window.end {
            if !self.booked.contains(&(date, cursor)) {
                slots.push(Slot {
                    date,
                    time: cursor,
                    available: true,
                });
            }
            match cursor.checked_add(self.granularity) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        slots
    }
}
