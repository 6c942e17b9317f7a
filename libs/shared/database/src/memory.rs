use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentStatus, Doctor, NewAppointment, Review, SlotKey, TimeOfDay,
    WorkingHours,
};

use crate::directory::{DoctorDirectory, DoctorSearchFilters};
use crate::error::DatabaseError;
use crate::ledger::{InsertOutcome, ReservationLedger};

// ==============================================================================
// LEDGER
// ==============================================================================

#[derive(Default)]
struct LedgerState {
    rows: HashMap<Uuid, Appointment>,
    /// Index of the CONFIRMED row holding each slot.
    confirmed: HashMap<SlotKey, Uuid>,
}

/// Process-local ledger. The check and the insert happen under one write
/// guard, which gives the same exactly-one-winner behavior as a unique index.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ReservationLedger for InMemoryLedger {
    async fn try_insert(&self, appointment: NewAppointment) -> Result<InsertOutcome, DatabaseError> {
        let key = appointment.slot_key();
        let mut state = self.state.write().await;

        if state.confirmed.contains_key(&key) {
            debug!("Slot {} {} for doctor {} already held", key.date, key.start_time, key.doctor_id);
            return Ok(InsertOutcome::SlotTaken);
        }

        let created = Appointment {
            id: Uuid::new_v4(),
            doctor_id: appointment.doctor_id,
            user_id: appointment.user_id,
            date: appointment.date,
            start_time: appointment.start_time,
            status: AppointmentStatus::Confirmed,
            appointment_type: appointment.appointment_type,
            meeting_reference: appointment.meeting_reference,
            created_at: Utc::now(),
        };

        state.confirmed.insert(key, created.id);
        state.rows.insert(created.id, created.clone());

        Ok(InsertOutcome::Inserted(created))
    }

    async fn cancel_owned(
        &self,
        appointment_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Appointment>, DatabaseError> {
        let mut state = self.state.write().await;

        let Some(row) = state
            .rows
            .get_mut(&appointment_id)
            .filter(|row| row.user_id == user_id)
        else {
            return Ok(None);
        };

        row.status = AppointmentStatus::Cancelled;
        let cancelled = row.clone();

        let key = cancelled.slot_key();
        if state.confirmed.get(&key) == Some(&appointment_id) {
            state.confirmed.remove(&key);
        }

        Ok(Some(cancelled))
    }

    async fn confirmed_slots(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SlotKey>, DatabaseError> {
        let state = self.state.read().await;
        let mut keys: Vec<SlotKey> = state
            .confirmed
            .keys()
            .filter(|key| key.doctor_id == doctor_id && key.date >= from && key.date <= to)
            .copied()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn appointments_for_user(&self, user_id: &str) -> Result<Vec<Appointment>, DatabaseError> {
        let state = self.state.read().await;
        let mut appointments: Vec<Appointment> = state
            .rows
            .values()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        appointments.sort_by(|a, b| {
            (a.date, a.start_time, a.created_at).cmp(&(b.date, b.start_time, b.created_at))
        });
        Ok(appointments)
    }
}

// ==============================================================================
// DIRECTORY
// ==============================================================================

/// Static doctor directory, used for local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    doctors: Vec<Doctor>,
    working_hours: Vec<WorkingHours>,
    reviews: Vec<Review>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctor(
        mut self,
        doctor: Doctor,
        working_hours: Vec<WorkingHours>,
        reviews: Vec<Review>,
    ) -> Self {
        self.doctors.push(doctor);
        self.working_hours.extend(working_hours);
        self.reviews.extend(reviews);
        self
    }

    /// Demo directory: six doctors working Mon-Thu 09:00-17:00 and
    /// Fri 09:00-13:00, each with two reviews.
    pub fn seeded() -> Self {
        let doctors = [
            ("Dr. Sarah Smith", "Cardiologist", 150.0, "Expert in heart health with 10 years experience."),
            ("Dr. John Doe", "Dermatologist", 100.0, "Specialist in skin care and treatments."),
            ("Dr. Emily White", "Pediatrician", 120.0, "Caring for children from infancy to young adulthood."),
            ("Dr. Michael Brown", "Neurologist", 200.0, "Treating disorders of the nervous system."),
            ("Dr. Jessica Davis", "General Physician", 80.0, "Your first stop for general health concerns."),
            ("Dr. David Wilson", "Orthopedic", 180.0, "Specializing in bones, joints, and muscles."),
        ];

        let full_day = (hm(9, 0), hm(17, 0));
        let half_day = (hm(9, 0), hm(13, 0));
        let week = [(1, full_day), (2, full_day), (3, full_day), (4, full_day), (5, half_day)];

        let now = Utc::now();
        let directory = doctors.into_iter().fold(Self::new(), |directory, (name, specialization, fee, bio)| {
            let doctor = Doctor {
                id: Uuid::new_v4(),
                name: name.to_string(),
                specialization: specialization.to_string(),
                bio: Some(bio.to_string()),
                fee,
            };

            let hours = week
                .iter()
                .map(|&(day_of_week, (start_time, end_time))| WorkingHours {
                    doctor_id: doctor.id,
                    day_of_week,
                    start_time,
                    end_time,
                })
                .collect();

            let reviews = vec![
                Review {
                    id: Uuid::new_v4(),
                    doctor_id: doctor.id,
                    author_name: Some("Demo Patient".to_string()),
                    rating: 5,
                    comment: Some("Excellent doctor, very patient.".to_string()),
                    created_at: now - Duration::days(2),
                },
                Review {
                    id: Uuid::new_v4(),
                    doctor_id: doctor.id,
                    author_name: Some("Demo Patient".to_string()),
                    rating: 4,
                    comment: Some("Good experience but wait time was long.".to_string()),
                    created_at: now - Duration::days(1),
                },
            ];

            directory.with_doctor(doctor, hours, reviews)
        });

        info!("Seeded in-memory directory with {} doctors", directory.doctors.len());
        directory
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }
}

fn hm(hour: u16, minute: u16) -> TimeOfDay {
    TimeOfDay::from_hm(hour, minute).unwrap_or(TimeOfDay::MIDNIGHT)
}

#[async_trait]
impl DoctorDirectory for InMemoryDirectory {
    async fn search_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DatabaseError> {
        Ok(self
            .doctors
            .iter()
            .filter(|doctor| filters.matches(doctor))
            .cloned()
            .collect())
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DatabaseError> {
        Ok(self.doctors.iter().find(|doctor| doctor.id == doctor_id).cloned())
    }

    async fn working_hours(&self, doctor_id: Uuid) -> Result<Vec<WorkingHours>, DatabaseError> {
        Ok(self
            .working_hours
            .iter()
            .filter(|hours| hours.doctor_id == doctor_id)
            .cloned()
            .collect())
    }

    async fn reviews(&self, doctor_id: Uuid) -> Result<Vec<Review>, DatabaseError> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|review| review.doctor_id == doctor_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}
