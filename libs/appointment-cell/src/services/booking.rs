use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_database::{AppState, DoctorDirectory, InsertOutcome, ReservationLedger};
use shared_models::scheduling::{
    Appointment, AppointmentType, NewAppointment, TimeOfDay, TimeParseError, SLOT_MINUTES,
};

use crate::models::{BookAppointmentRequest, BookingError};

/// A booking request that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub appointment_type: AppointmentType,
}

impl ValidatedBooking {
    pub fn parse(request: &BookAppointmentRequest) -> Result<Self, BookingError> {
        let doctor_id = present(request.doctor_id.as_deref());
        let date = present(request.date.as_deref());
        let start_time = present(request.start_time.as_deref());

        let (Some(doctor_id), Some(date), Some(start_time)) = (doctor_id, date, start_time) else {
            let missing: Vec<&str> = [
                ("doctorId", doctor_id.is_none()),
                ("date", date.is_none()),
                ("startTime", start_time.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect();
            return Err(BookingError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let doctor_id = Uuid::parse_str(doctor_id)
            .map_err(|_| BookingError::Validation(format!("Invalid doctorId '{}'", doctor_id)))?;

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            BookingError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", date))
        })?;

        let start_time: TimeOfDay = start_time
            .parse()
            .map_err(|e: TimeParseError| BookingError::Validation(e.to_string()))?;
        if start_time >= TimeOfDay::END_OF_DAY || !start_time.is_aligned(SLOT_MINUTES) {
            return Err(BookingError::Validation(format!(
                "Start time {} is not a {} minute slot boundary",
                start_time, SLOT_MINUTES
            )));
        }

        let appointment_type = match present(request.appointment_type.as_deref()) {
            Some(raw) => raw.parse().map_err(BookingError::Validation)?,
            None => AppointmentType::default(),
        };

        Ok(Self {
            doctor_id,
            date,
            start_time,
            appointment_type,
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Claims slots on behalf of authenticated users.
///
/// There is no availability pre-check here: the ledger's atomic
/// insert-if-absent is the only thing that decides who gets a slot.
pub struct BookingCoordinator {
    ledger: Arc<dyn ReservationLedger>,
    directory: Arc<dyn DoctorDirectory>,
    meeting_base_url: String,
}

impl BookingCoordinator {
    pub fn new(state: &AppState) -> Self {
        Self {
            ledger: Arc::clone(&state.ledger),
            directory: Arc::clone(&state.directory),
            meeting_base_url: state.config.meeting_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn claim(
        &self,
        user_id: &str,
        request: &BookAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        let booking = ValidatedBooking::parse(request)?;

        debug!(
            "User {} claiming {} {} with doctor {}",
            user_id, booking.date, booking.start_time, booking.doctor_id
        );

        if self.directory.get_doctor(booking.doctor_id).await?.is_none() {
            return Err(BookingError::DoctorNotFound);
        }

        let meeting_reference = match booking.appointment_type {
            AppointmentType::Video => Some(self.meeting_reference(booking.doctor_id, user_id, Utc::now())),
            AppointmentType::InPerson => None,
        };

        let new_appointment = NewAppointment {
            doctor_id: booking.doctor_id,
            user_id: user_id.to_string(),
            date: booking.date,
            start_time: booking.start_time,
            appointment_type: booking.appointment_type,
            meeting_reference,
        };

        match self.ledger.try_insert(new_appointment).await {
            Ok(InsertOutcome::Inserted(appointment)) => {
                info!(
                    "Appointment {} confirmed for doctor {} on {} at {}",
                    appointment.id, appointment.doctor_id, appointment.date, appointment.start_time
                );
                Ok(appointment)
            }
            Ok(InsertOutcome::SlotTaken) => {
                warn!(
                    "Slot {} {} for doctor {} already booked",
                    booking.date, booking.start_time, booking.doctor_id
                );
                Err(BookingError::SlotTaken)
            }
            Err(e) => {
                error!(
                    "Failed to store appointment for doctor {} on {} at {}: {}",
                    booking.doctor_id, booking.date, booking.start_time, e
                );
                Err(e.into())
            }
        }
    }

    /// Opaque video meeting link. Carries no uniqueness guarantee.
    pub fn meeting_reference(&self, doctor_id: Uuid, user_id: &str, at: DateTime<Utc>) -> String {
        format!(
            "{}/clinic-{}-{}-{}",
            self.meeting_base_url,
            doctor_id,
            user_id,
            at.timestamp_millis()
        )
    }
}
