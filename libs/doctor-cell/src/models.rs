use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;
use shared_models::scheduling::{Doctor, Review, WorkingHours};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorListing {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub average_rating: f64,
    pub review_count: usize,
    pub next_available_slot: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDetails {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub working_hours: Vec<WorkingHours>,
    pub reviews: Vec<Review>,
    pub average_rating: f64,
    pub review_count: usize,
}

/// Raw `?start=&end=` query. Kept as strings so missing or malformed dates
/// get a descriptive 400 instead of the extractor's rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Mean rating rounded to one decimal, 0 without reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let mean = f64::from(total) / reviews.len() as f64;
    (mean * 10.0).round() / 10.0
}

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("{0}")]
    InvalidQuery(String),

    #[error("Storage error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<DoctorError> for AppError {
    fn from(error: DoctorError) -> Self {
        match error {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::InvalidQuery(msg) => AppError::ValidationError(msg),
            DoctorError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: Uuid::new_v4(),
            doctor_id: Uuid::nil(),
            author_name: None,
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn average_rating_rounds_to_one_decimal() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[review(5), review(4)]), 4.5);
        assert_eq!(average_rating(&[review(5), review(4), review(4)]), 4.3);
    }

    #[test]
    fn listing_flattens_doctor_fields() {
        let listing = DoctorListing {
            doctor: Doctor {
                id: Uuid::nil(),
                name: "Dr. Emily White".to_string(),
                specialization: "Pediatrician".to_string(),
                bio: None,
                fee: 120.0,
            },
            average_rating: 4.5,
            review_count: 2,
            next_available_slot: "Tomorrow, 09:00".to_string(),
        };

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["name"], "Dr. Emily White");
        assert_eq!(value["averageRating"], 4.5);
        assert_eq!(value["nextAvailableSlot"], "Tomorrow, 09:00");
    }
}
