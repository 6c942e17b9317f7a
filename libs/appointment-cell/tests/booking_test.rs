use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use appointment_cell::handlers::{book_appointment, cancel_appointment, get_my_appointments};
use appointment_cell::models::BookAppointmentRequest;
use doctor_cell::handlers::get_doctor_availability;
use doctor_cell::models::AvailabilityQuery;
use shared_database::{AppState, InMemoryDirectory, InMemoryLedger};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::scheduling::{AppointmentStatus, AppointmentType, Doctor, Slot, WorkingHours};
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{TestCalendar, TestConfig, TestUser};

struct Fixture {
    state: Arc<AppState>,
    doctor: Doctor,
}

/// One doctor working Monday 09:00-17:00, clock pinned well before the test week.
fn fixture() -> Fixture {
    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: "Dr. Sarah Smith".to_string(),
        specialization: "Cardiologist".to_string(),
        bio: None,
        fee: 150.0,
    };
    let hours = WorkingHours {
        doctor_id: doctor.id,
        day_of_week: 1,
        start_time: "09:00".parse().unwrap(),
        end_time: "17:00".parse().unwrap(),
    };

    let state = AppState::new(
        TestConfig::default().to_app_config(),
        Arc::new(InMemoryLedger::new()),
        Arc::new(InMemoryDirectory::new().with_doctor(doctor.clone(), vec![hours], Vec::new())),
        Arc::new(FixedClock(TestCalendar::long_before())),
    );

    Fixture {
        state: Arc::new(state),
        doctor,
    }
}

fn patient(email: &str) -> Extension<User> {
    Extension(TestUser::patient(email).to_user())
}

type BookingBody = Result<Json<BookAppointmentRequest>, JsonRejection>;

fn booking(doctor_id: Uuid, date: &str, start_time: &str) -> BookingBody {
    typed_booking(doctor_id, date, start_time, None)
}

fn typed_booking(doctor_id: Uuid, date: &str, start_time: &str, kind: Option<&str>) -> BookingBody {
    Ok(Json(BookAppointmentRequest {
        doctor_id: Some(doctor_id.to_string()),
        date: Some(date.to_string()),
        start_time: Some(start_time.to_string()),
        appointment_type: kind.map(str::to_string),
    }))
}

async fn monday_slots(fx: &Fixture) -> Vec<Slot> {
    get_doctor_availability(
        State(fx.state.clone()),
        Path(fx.doctor.id.to_string()),
        Query(AvailabilityQuery {
            start: Some("2025-12-01".to_string()),
            end: Some("2025-12-01".to_string()),
        }),
    )
    .await
    .unwrap()
    .0
}

fn has_time(slots: &[Slot], time: &str) -> bool {
    slots.iter().any(|slot| slot.time.to_string() == time)
}

#[tokio::test]
async fn claim_then_cancel_round_trips_availability() {
    let fx = fixture();
    let alice = patient("alice@example.com");
    let bob = patient("bob@example.com");

    assert_eq!(monday_slots(&fx).await.len(), 16);

    let appointment = book_appointment(State(fx.state.clone()), alice.clone(), booking(fx.doctor.id, "2025-12-01", "10:00"))
        .await
        .unwrap()
        .0;
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(appointment.appointment_type, AppointmentType::InPerson);
    assert_eq!(appointment.user_id, alice.0.id);
    assert!(appointment.meeting_reference.is_none());

    let slots = monday_slots(&fx).await;
    assert_eq!(slots.len(), 15);
    assert!(!has_time(&slots, "10:00"));

    let second = book_appointment(State(fx.state.clone()), bob, booking(fx.doctor.id, "2025-12-01", "10:00")).await;
    assert_matches!(second, Err(AppError::Conflict(msg)) => assert_eq!(msg, "Slot already booked"));

    let cancelled = cancel_appointment(State(fx.state.clone()), Path(appointment.id.to_string()), alice)
        .await
        .unwrap()
        .0;
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let slots = monday_slots(&fx).await;
    assert_eq!(slots.len(), 16);
    assert!(has_time(&slots, "10:00"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_have_exactly_one_winner() {
    let fx = fixture();

    let racers: Vec<_> = ["alice@example.com", "bob@example.com"]
        .into_iter()
        .map(|email| {
            let state = fx.state.clone();
            let doctor_id = fx.doctor.id;
            tokio::spawn(async move {
                book_appointment(State(state), patient(email), booking(doctor_id, "2025-12-01", "11:30"))
                    .await
                    .map(|_| StatusCode::OK)
                    .unwrap_or_else(|e| e.status_code())
                    .as_u16()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for racer in racers {
        statuses.push(racer.await.unwrap());
    }
    statuses.sort();

    assert_eq!(statuses, vec![200, 409]);
}

#[tokio::test]
async fn second_cancel_keeps_appointment_cancelled() {
    let fx = fixture();
    let alice = patient("alice@example.com");

    let appointment = book_appointment(State(fx.state.clone()), alice.clone(), booking(fx.doctor.id, "2025-12-01", "09:00"))
        .await
        .unwrap()
        .0;

    let id = appointment.id.to_string();
    let first = cancel_appointment(State(fx.state.clone()), Path(id.clone()), alice.clone()).await.unwrap().0;
    let second = cancel_appointment(State(fx.state.clone()), Path(id), alice).await.unwrap().0;

    assert_eq!(first.status, AppointmentStatus::Cancelled);
    assert_eq!(second.status, AppointmentStatus::Cancelled);
    assert_eq!(second.id, appointment.id);
    assert!(has_time(&monday_slots(&fx).await, "09:00"));
}

#[tokio::test]
async fn rebooking_after_cancel_creates_a_new_appointment() {
    let fx = fixture();
    let alice = patient("alice@example.com");
    let bob = patient("bob@example.com");

    let original = book_appointment(State(fx.state.clone()), alice.clone(), booking(fx.doctor.id, "2025-12-01", "14:00"))
        .await
        .unwrap()
        .0;
    cancel_appointment(State(fx.state.clone()), Path(original.id.to_string()), alice.clone())
        .await
        .unwrap();

    let rebooked = book_appointment(State(fx.state.clone()), bob, booking(fx.doctor.id, "2025-12-01", "14:00"))
        .await
        .unwrap()
        .0;
    assert_ne!(rebooked.id, original.id);

    // Cancelling the old row again must not free the slot bob now holds.
    cancel_appointment(State(fx.state.clone()), Path(original.id.to_string()), alice)
        .await
        .unwrap();
    assert!(!has_time(&monday_slots(&fx).await, "14:00"));
}

#[tokio::test]
async fn cancel_by_other_user_is_not_found() {
    let fx = fixture();
    let alice = patient("alice@example.com");

    let appointment = book_appointment(State(fx.state.clone()), alice, booking(fx.doctor.id, "2025-12-01", "15:00"))
        .await
        .unwrap()
        .0;

    let result = cancel_appointment(
        State(fx.state.clone()),
        Path(appointment.id.to_string()),
        patient("mallory@example.com"),
    )
    .await;
    assert_matches!(result, Err(AppError::NotFound(_)));

    let malformed = cancel_appointment(State(fx.state.clone()), Path("42".to_string()), patient("x@example.com")).await;
    assert_matches!(malformed, Err(AppError::NotFound(_)));

    assert!(!has_time(&monday_slots(&fx).await, "15:00"));
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let fx = fixture();

    let result = book_appointment(
        State(fx.state.clone()),
        patient("alice@example.com"),
        Ok(Json(BookAppointmentRequest {
            doctor_id: Some(fx.doctor.id.to_string()),
            ..Default::default()
        })),
    )
    .await;

    let error = result.unwrap_err();
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_type_is_rejected() {
    let fx = fixture();
    let request = typed_booking(fx.doctor.id, "2025-12-01", "10:00", Some("HOUSE_CALL"));

    let result = book_appointment(State(fx.state.clone()), patient("alice@example.com"), request).await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
    assert_eq!(monday_slots(&fx).await.len(), 16);
}

#[tokio::test]
async fn booking_unknown_doctor_is_not_found() {
    let fx = fixture();

    let result = book_appointment(
        State(fx.state.clone()),
        patient("alice@example.com"),
        booking(Uuid::new_v4(), "2025-12-01", "10:00"),
    )
    .await;

    assert_matches!(result, Err(AppError::NotFound(msg)) => assert_eq!(msg, "Doctor not found"));
}

#[tokio::test]
async fn video_booking_carries_meeting_reference() {
    let fx = fixture();
    let alice = patient("alice@example.com");
    let request = typed_booking(fx.doctor.id, "2025-12-01", "16:30", Some("VIDEO"));

    let appointment = book_appointment(State(fx.state.clone()), alice.clone(), request)
        .await
        .unwrap()
        .0;

    assert_eq!(appointment.appointment_type, AppointmentType::Video);
    let reference = appointment.meeting_reference.unwrap();
    let prefix = format!("https://meet.example.test/clinic-{}-{}-", fx.doctor.id, alice.0.id);
    assert!(reference.starts_with(&prefix), "{reference}");
    assert!(reference[prefix.len()..].parse::<i64>().is_ok());
}

#[tokio::test]
async fn my_appointments_are_ordered_and_include_doctor() {
    let fx = fixture();
    let alice = patient("alice@example.com");
    let bob = patient("bob@example.com");

    for (date, time) in [("2025-12-08", "09:00"), ("2025-12-01", "16:00"), ("2025-12-01", "09:30")] {
        book_appointment(State(fx.state.clone()), alice.clone(), booking(fx.doctor.id, date, time))
            .await
            .unwrap();
    }
    let cancelled = book_appointment(State(fx.state.clone()), alice.clone(), booking(fx.doctor.id, "2025-12-01", "12:00"))
        .await
        .unwrap()
        .0;
    cancel_appointment(State(fx.state.clone()), Path(cancelled.id.to_string()), alice.clone())
        .await
        .unwrap();
    book_appointment(State(fx.state.clone()), bob, booking(fx.doctor.id, "2025-12-01", "10:00"))
        .await
        .unwrap();

    let mine = get_my_appointments(State(fx.state.clone()), alice).await.unwrap().0;

    let order: Vec<String> = mine
        .iter()
        .map(|a| format!("{} {}", a.appointment.date, a.appointment.start_time))
        .collect();
    assert_eq!(
        order,
        vec!["2025-12-01 09:30", "2025-12-01 12:00", "2025-12-01 16:00", "2025-12-08 09:00"]
    );
    assert_eq!(mine[1].appointment.status, AppointmentStatus::Cancelled);
    assert!(mine.iter().all(|a| a.doctor.as_ref() == Some(&fx.doctor)));

    let json = serde_json::to_value(&mine[0]).unwrap();
    assert_eq!(json["startTime"], "09:30");
    assert_eq!(json["doctor"]["name"], "Dr. Sarah Smith");
}
