use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use shared_models::scheduling::{Doctor, Review, WorkingHours};

use crate::error::DatabaseError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchFilters {
    /// Case-insensitive substring of name or specialization.
    pub search: Option<String>,
    /// Exact specialization.
    pub specialization: Option<String>,
}

impl DoctorSearchFilters {
    pub fn matches(&self, doctor: &Doctor) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                doctor.name.to_lowercase().contains(&term)
                    || doctor.specialization.to_lowercase().contains(&term)
            }
            _ => true,
        };

        let specialization_ok = match self.specialization.as_deref() {
            Some(specialization) if !specialization.is_empty() => doctor.specialization == specialization,
            _ => true,
        };

        search_ok && specialization_ok
    }
}

/// Read-only view of the doctor directory and its reviews.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn search_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DatabaseError>;

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DatabaseError>;

    async fn working_hours(&self, doctor_id: Uuid) -> Result<Vec<WorkingHours>, DatabaseError>;

    /// Reviews for a doctor, newest first.
    async fn reviews(&self, doctor_id: Uuid) -> Result<Vec<Review>, DatabaseError>;
}
