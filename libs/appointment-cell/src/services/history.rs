use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use shared_database::{AppState, DoctorDirectory, ReservationLedger};

use crate::models::{BookingError, MyAppointment};

/// The caller's own appointments, joined with the doctor directory.
pub struct AppointmentHistoryService {
    ledger: Arc<dyn ReservationLedger>,
    directory: Arc<dyn DoctorDirectory>,
}

impl AppointmentHistoryService {
    pub fn new(state: &AppState) -> Self {
        Self {
            ledger: Arc::clone(&state.ledger),
            directory: Arc::clone(&state.directory),
        }
    }

    /// All statuses, ordered by date then start time.
    pub async fn appointments_for(&self, user_id: &str) -> Result<Vec<MyAppointment>, BookingError> {
        let appointments = self.ledger.appointments_for_user(user_id).await?;
        debug!("User {} has {} appointments", user_id, appointments.len());

        let mut doctor_ids: Vec<_> = appointments.iter().map(|a| a.doctor_id).collect();
        doctor_ids.sort();
        doctor_ids.dedup();

        let doctors = try_join_all(doctor_ids.into_iter().map(|id| self.directory.get_doctor(id))).await?;
        let doctors: HashMap<_, _> = doctors
            .into_iter()
            .flatten()
            .map(|doctor| (doctor.id, doctor))
            .collect();

        Ok(appointments
            .into_iter()
            .map(|appointment| MyAppointment {
                doctor: doctors.get(&appointment.doctor_id).cloned(),
                appointment,
            })
            .collect())
    }
}
