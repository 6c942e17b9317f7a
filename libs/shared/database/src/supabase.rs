use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::scheduling::{
    Appointment, AppointmentStatus, AppointmentType, Doctor, NewAppointment, Review, SlotKey,
    TimeOfDay, WorkingHours,
};

use crate::directory::{DoctorDirectory, DoctorSearchFilters};
use crate::error::DatabaseError;
use crate::ledger::{InsertOutcome, ReservationLedger};

/// Postgres SQLSTATE for unique_violation, echoed by PostgREST in `code`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|_| DatabaseError::NotConfigured("anon key is not a valid header".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| DatabaseError::NotConfigured("token is not a valid header".to_string()))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            let code = serde_json::from_str::<Value>(&error_text)
                .ok()
                .and_then(|v| v.get("code").and_then(Value::as_str).map(str::to_string));

            // PostgREST answers 409 for foreign key violations too; only 23505 means the slot is held.
            if code.as_deref() == Some(UNIQUE_VIOLATION) {
                debug!("Unique constraint rejected write: {}", error_text);
                return Err(DatabaseError::UniqueViolation(error_text));
            }

            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => DatabaseError::Auth(error_text),
                404 => DatabaseError::NotFound(error_text),
                other => DatabaseError::Api { status: other, message: error_text },
            });
        }

        Ok(response.json::<T>().await?)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

// ==============================================================================
// ROW SHAPES
// ==============================================================================

/// `appointments` table row. The table carries
/// `UNIQUE (doctor_id, date, start_time) WHERE status = 'CONFIRMED'`.
#[derive(Debug, Deserialize)]
struct AppointmentRow {
    id: Uuid,
    doctor_id: Uuid,
    user_id: String,
    date: NaiveDate,
    start_time: TimeOfDay,
    status: AppointmentStatus,
    #[serde(rename = "type")]
    appointment_type: AppointmentType,
    meeting_reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Appointment {
            id: row.id,
            doctor_id: row.doctor_id,
            user_id: row.user_id,
            date: row.date,
            start_time: row.start_time,
            status: row.status,
            appointment_type: row.appointment_type,
            meeting_reference: row.meeting_reference,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SlotKeyRow {
    doctor_id: Uuid,
    date: NaiveDate,
    start_time: TimeOfDay,
}

#[derive(Debug, Deserialize)]
struct WorkingHoursRow {
    doctor_id: Uuid,
    day_of_week: u8,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    id: Uuid,
    doctor_id: Uuid,
    author_name: Option<String>,
    rating: u8,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

// ==============================================================================
// LEDGER
// ==============================================================================

/// Ledger backed by the Supabase `appointments` table. The partial unique
/// index makes the insert itself the conflict check.
pub struct SupabaseLedger {
    supabase: SupabaseClient,
    service_key: String,
}

impl SupabaseLedger {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            service_key: config.storage_key().to_string(),
        }
    }

    fn token(&self) -> Option<&str> {
        (!self.service_key.is_empty()).then_some(self.service_key.as_str())
    }
}

#[async_trait]
impl ReservationLedger for SupabaseLedger {
    async fn try_insert(&self, appointment: NewAppointment) -> Result<InsertOutcome, DatabaseError> {
        let row = json!({
            "doctor_id": appointment.doctor_id,
            "user_id": appointment.user_id,
            "date": appointment.date,
            "start_time": appointment.start_time,
            "status": AppointmentStatus::Confirmed,
            "type": appointment.appointment_type,
            "meeting_reference": appointment.meeting_reference,
        });

        let result: Result<Vec<AppointmentRow>, DatabaseError> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                self.token(),
                Some(row),
                Some(return_representation()),
            )
            .await;

        match result {
            Ok(rows) => rows
                .into_iter()
                .next()
                .map(|row| InsertOutcome::Inserted(row.into()))
                .ok_or_else(|| DatabaseError::UnexpectedResponse("insert returned no rows".to_string())),
            Err(DatabaseError::UniqueViolation(_)) => Ok(InsertOutcome::SlotTaken),
            Err(e) => Err(e),
        }
    }

    async fn cancel_owned(
        &self,
        appointment_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Appointment>, DatabaseError> {
        // Both filters in one PATCH: ownership and the transition are a single statement.
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&user_id=eq.{}",
            appointment_id,
            encode(user_id)
        );

        let rows: Vec<AppointmentRow> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                self.token(),
                Some(json!({ "status": AppointmentStatus::Cancelled })),
                Some(return_representation()),
            )
            .await?;

        if rows.len() > 1 {
            warn!("Cancellation of {} matched {} rows", appointment_id, rows.len());
        }

        Ok(rows.into_iter().next().map(Appointment::from))
    }

    async fn confirmed_slots(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SlotKey>, DatabaseError> {
        let path = format!(
            "/rest/v1/appointments?select=doctor_id,date,start_time&doctor_id=eq.{}&status=eq.{}&date=gte.{}&date=lte.{}&order=date.asc,start_time.asc",
            doctor_id,
            AppointmentStatus::Confirmed,
            from,
            to
        );

        let rows: Vec<SlotKeyRow> = self.supabase.request(Method::GET, &path, self.token(), None).await?;

        Ok(rows
            .into_iter()
            .map(|row| SlotKey {
                doctor_id: row.doctor_id,
                date: row.date,
                start_time: row.start_time,
            })
            .collect())
    }

    async fn appointments_for_user(&self, user_id: &str) -> Result<Vec<Appointment>, DatabaseError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&order=date.asc,start_time.asc",
            encode(user_id)
        );

        let rows: Vec<AppointmentRow> = self.supabase.request(Method::GET, &path, self.token(), None).await?;

        Ok(rows.into_iter().map(Appointment::from).collect())
    }
}

// ==============================================================================
// DIRECTORY
// ==============================================================================

/// Read-only directory over the `doctors`, `working_hours` and `reviews` tables.
pub struct SupabaseDirectory {
    supabase: SupabaseClient,
    anon_key: String,
}

impl SupabaseDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn token(&self) -> Option<&str> {
        (!self.anon_key.is_empty()).then_some(self.anon_key.as_str())
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseDirectory {
    async fn search_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DatabaseError> {
        let mut path = "/rest/v1/doctors?select=id,name,specialization,bio,fee&order=name.asc".to_string();

        if let Some(term) = filters.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = encode(&format!("*{}*", term));
            path.push_str(&format!(
                "&or=(name.ilike.{},specialization.ilike.{})",
                pattern, pattern
            ));
        }
        if let Some(specialization) = filters.specialization.as_deref().filter(|s| !s.is_empty()) {
            path.push_str(&format!("&specialization=eq.{}", encode(specialization)));
        }

        self.supabase.request(Method::GET, &path, self.token(), None).await
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DatabaseError> {
        let path = format!(
            "/rest/v1/doctors?select=id,name,specialization,bio,fee&id=eq.{}",
            doctor_id
        );
        let doctors: Vec<Doctor> = self.supabase.request(Method::GET, &path, self.token(), None).await?;
        Ok(doctors.into_iter().next())
    }

    async fn working_hours(&self, doctor_id: Uuid) -> Result<Vec<WorkingHours>, DatabaseError> {
        let path = format!(
            "/rest/v1/working_hours?doctor_id=eq.{}&order=day_of_week.asc,start_time.asc",
            doctor_id
        );
        let rows: Vec<WorkingHoursRow> = self.supabase.request(Method::GET, &path, self.token(), None).await?;

        Ok(rows
            .into_iter()
            .map(|row| WorkingHours {
                doctor_id: row.doctor_id,
                day_of_week: row.day_of_week,
                start_time: row.start_time,
                end_time: row.end_time,
            })
            .collect())
    }

    async fn reviews(&self, doctor_id: Uuid) -> Result<Vec<Review>, DatabaseError> {
        let path = format!(
            "/rest/v1/reviews?doctor_id=eq.{}&order=created_at.desc",
            doctor_id
        );
        let rows: Vec<ReviewRow> = self.supabase.request(Method::GET, &path, self.token(), None).await?;

        Ok(rows
            .into_iter()
            .map(|row| Review {
                id: row.id,
                doctor_id: row.doctor_id,
                author_name: row.author_name,
                rating: row.rating,
                comment: row.comment,
                created_at: row.created_at,
            })
            .collect())
    }
}
