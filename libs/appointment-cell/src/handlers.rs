use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    Json,
};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::scheduling::Appointment;

use crate::models::{BookAppointmentRequest, MyAppointment};
use crate::services::{AppointmentHistoryService, BookingCoordinator, CancellationHandler};

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<Json<Appointment>, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;

    let coordinator = BookingCoordinator::new(&state);

    let appointment = coordinator.claim(&user.id, &request).await?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<MyAppointment>>, AppError> {
    let history_service = AppointmentHistoryService::new(&state);

    let appointments = history_service.appointments_for(&user.id).await?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Appointment>, AppError> {
    // A malformed id can never match a row, so it reads as not found.
    let appointment_id = Uuid::parse_str(&appointment_id)
        .map_err(|_| AppError::NotFound("Appointment not found".to_string()))?;

    let handler = CancellationHandler::new(&state);

    let appointment = handler.cancel(&user.id, appointment_id).await?;

    Ok(Json(appointment))
}
