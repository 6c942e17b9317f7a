use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_models::scheduling::{Appointment, NewAppointment, SlotKey};

use crate::error::DatabaseError;

/// Result of the atomic insert-if-absent.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Appointment),
    /// A CONFIRMED appointment already holds the slot.
    SlotTaken,
}

/// Durable record of appointments.
///
/// The ledger is the only arbiter of slot uniqueness: for any
/// `(doctor_id, date, start_time)` at most one CONFIRMED row may exist, and
/// [`try_insert`](ReservationLedger::try_insert) must decide that in a
/// single atomic step. Implementations never delete rows.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    /// Creates a CONFIRMED appointment unless its slot is already held.
    async fn try_insert(&self, appointment: NewAppointment) -> Result<InsertOutcome, DatabaseError>;

    /// Marks the appointment CANCELLED if it exists and belongs to `user_id`,
    /// in one conditional update. Returns `None` for unknown or foreign ids.
    async fn cancel_owned(
        &self,
        appointment_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Appointment>, DatabaseError>;

    /// Keys of CONFIRMED appointments for a doctor within `[from, to]`.
    async fn confirmed_slots(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SlotKey>, DatabaseError>;

    /// All of a user's appointments, any status, ordered by date then time.
    async fn appointments_for_user(&self, user_id: &str) -> Result<Vec<Appointment>, DatabaseError>;
}
