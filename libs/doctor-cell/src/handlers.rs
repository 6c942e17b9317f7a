use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use shared_database::{AppState, DoctorSearchFilters};
use shared_models::error::AppError;
use shared_models::scheduling::Slot;

use crate::models::{AvailabilityQuery, DoctorDetails, DoctorListing};
use crate::services::{AvailabilityService, DoctorService};

fn parse_doctor_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Doctor not found".to_string()))
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::ValidationError(format!("Invalid {} date '{}', expected YYYY-MM-DD", field, raw))
    })
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<DoctorSearchFilters>,
) -> Result<Json<Vec<DoctorListing>>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctors = doctor_service.list_doctors(&filters, state.clock.now()).await?;

    Ok(Json(doctors))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<DoctorDetails>, AppError> {
    let doctor_id = parse_doctor_id(&doctor_id)?;
    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service.get_doctor_details(doctor_id).await?;

    Ok(Json(doctor))
}

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let (Some(start), Some(end)) = (query.start.as_deref(), query.end.as_deref()) else {
        return Err(AppError::ValidationError("Start and end dates required".to_string()));
    };
    let start = parse_date(start, "start")?;
    let end = parse_date(end, "end")?;
    let doctor_id = parse_doctor_id(&doctor_id)?;

    let availability_service = AvailabilityService::new(&state);

    let slots = availability_service
        .get_available_slots(doctor_id, start, end, state.clock.now())
        .await?;

    Ok(Json(slots))
}
