use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{AppState, ReservationLedger};
use shared_models::scheduling::Appointment;

use crate::models::BookingError;

/// Cancels appointments for their owner. Cancelling twice is a no-op that
/// returns the already cancelled row.
pub struct CancellationHandler {
    ledger: Arc<dyn ReservationLedger>,
}

impl CancellationHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            ledger: Arc::clone(&state.ledger),
        }
    }

    pub async fn cancel(&self, user_id: &str, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        debug!("User {} cancelling appointment {}", user_id, appointment_id);

        let appointment = self
            .ledger
            .cancel_owned(appointment_id, user_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound)?;

        info!(
            "Appointment {} cancelled, slot {} {} for doctor {} released",
            appointment.id, appointment.date, appointment.start_time, appointment.doctor_id
        );

        Ok(appointment)
    }
}
