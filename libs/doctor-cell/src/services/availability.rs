use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;
use uuid::Uuid;

use shared_database::{AppState, DoctorDirectory, ReservationLedger};
use shared_models::scheduling::Slot;

use crate::models::DoctorError;
use crate::services::calendar::WorkingHoursCalendar;
use crate::services::next_available::{find_next_available, lookahead_end, NextSlot};
use crate::services::slots::SlotGenerator;

/// Read side of booking: which slots a doctor still has open.
pub struct AvailabilityService {
    directory: Arc<dyn DoctorDirectory>,
    ledger: Arc<dyn ReservationLedger>,
    max_range_days: i64,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            directory: Arc::clone(&state.directory),
            ledger: Arc::clone(&state.ledger),
            max_range_days: state.config.max_availability_days,
        }
    }

    pub async fn calendar_for(&self, doctor_id: Uuid) -> Result<WorkingHoursCalendar, DoctorError> {
        let hours = self.directory.working_hours(doctor_id).await?;
        Ok(WorkingHoursCalendar::from_working_hours(doctor_id, &hours))
    }

    /// Open slots for `[start, end]`, ordered by date then time.
    pub async fn get_available_slots(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<Slot>, DoctorError> {
        if end < start {
            return Err(DoctorError::InvalidQuery("End date must not be before start date".to_string()));
        }
        let span = (end - start).num_days() + 1;
        if span > self.max_range_days {
            return Err(DoctorError::InvalidQuery(format!(
                "Date range may span at most {} days",
                self.max_range_days
            )));
        }

        debug!("Calculating available slots for doctor {} from {} to {}", doctor_id, start, end);

        let calendar = self.calendar_for(doctor_id).await?;
        if calendar.is_empty() {
            return Ok(Vec::new());
        }

        let booked = self.ledger.confirmed_slots(doctor_id, start, end).await?;
        let slots = SlotGenerator::new(&calendar, booked).generate(start, end, now);

        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }

    /// Earliest open slot within the look-ahead window.
    pub async fn next_available_slot(
        &self,
        doctor_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Option<NextSlot>, DoctorError> {
        let calendar = self.calendar_for(doctor_id).await?;
        if calendar.is_empty() {
            return Ok(None);
        }

        let today = now.date();
        let booked = self
            .ledger
            .confirmed_slots(doctor_id, today, lookahead_end(today))
            .await?;

        Ok(find_next_available(&SlotGenerator::new(&calendar, booked), now))
    }
}
