use std::sync::Arc;

use chrono::NaiveDateTime;
use futures::future::try_join_all;
use tracing::debug;
use uuid::Uuid;

use shared_database::{AppState, DoctorDirectory, DoctorSearchFilters};

use crate::models::{average_rating, DoctorDetails, DoctorError, DoctorListing};
use crate::services::availability::AvailabilityService;
use crate::services::next_available::label_or_unavailable;

/// Directory listing annotated with ratings and the next open slot.
pub struct DoctorService {
    directory: Arc<dyn DoctorDirectory>,
    availability: AvailabilityService,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            directory: Arc::clone(&state.directory),
            availability: AvailabilityService::new(state),
        }
    }

    pub async fn list_doctors(
        &self,
        filters: &DoctorSearchFilters,
        now: NaiveDateTime,
    ) -> Result<Vec<DoctorListing>, DoctorError> {
        let doctors = self.directory.search_doctors(filters).await?;
        debug!("Directory returned {} doctors", doctors.len());

        try_join_all(doctors.into_iter().map(|doctor| async move {
            let reviews = self.directory.reviews(doctor.id).await?;
            let next = self.availability.next_available_slot(doctor.id, now).await?;

            Ok::<_, DoctorError>(DoctorListing {
                average_rating: average_rating(&reviews),
                review_count: reviews.len(),
                next_available_slot: label_or_unavailable(next.as_ref()),
                doctor,
            })
        }))
        .await
    }

    pub async fn get_doctor_details(&self, doctor_id: Uuid) -> Result<DoctorDetails, DoctorError> {
        let doctor = self
            .directory
            .get_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)?;

        let (working_hours, reviews) = futures::try_join!(
            self.directory.working_hours(doctor_id),
            self.directory.reviews(doctor_id),
        )?;

        Ok(DoctorDetails {
            average_rating: average_rating(&reviews),
            review_count: reviews.len(),
            doctor,
            working_hours,
            reviews,
        })
    }
}
