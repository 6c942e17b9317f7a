use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;
use shared_models::scheduling::{Appointment, Doctor};

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

/// Booking body. Fields are optional so missing values get a message naming
/// them; undecodable bodies are rejected by the handler as a 400.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    #[serde(rename = "type")]
    pub appointment_type: Option<String>,
}

/// An appointment as listed for its owner, with the doctor summary attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyAppointment {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<Doctor>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("Slot already booked")]
    SlotTaken,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Storage error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        match error {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::SlotTaken => AppError::Conflict("Slot already booked".to_string()),
            BookingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            BookingError::AppointmentNotFound => AppError::NotFound("Appointment not found".to_string()),
            BookingError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn request_reads_camel_case_and_type() {
        let request: BookAppointmentRequest = serde_json::from_value(serde_json::json!({
            "doctorId": "abc",
            "date": "2025-12-01",
            "startTime": "10:00",
            "type": "VIDEO"
        }))
        .unwrap();

        assert_eq!(request.doctor_id.as_deref(), Some("abc"));
        assert_eq!(request.start_time.as_deref(), Some("10:00"));
        assert_eq!(request.appointment_type.as_deref(), Some("VIDEO"));
    }

    #[test]
    fn booking_errors_map_to_http_statuses() {
        let cases = [
            (BookingError::Validation("bad".to_string()), StatusCode::BAD_REQUEST),
            (BookingError::SlotTaken, StatusCode::CONFLICT),
            (BookingError::DoctorNotFound, StatusCode::NOT_FOUND),
            (BookingError::AppointmentNotFound, StatusCode::NOT_FOUND),
            (
                BookingError::Database(DatabaseError::UnexpectedResponse("empty".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::from(error).status_code(), status);
        }
    }
}
