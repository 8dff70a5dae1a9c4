use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_client::{
    BookingClient, BookingDraft, ClientError, CredentialPersistence, CredentialStore,
    EphemeralCredentialStore, FileCredentialStore,
};
use doctor_cell::services::projector::SlotRunError;
use shared_models::schedule::SlotStatus;
use shared_utils::test_utils::MockSupabaseResponses;

const DOCTOR_ID: i64 = 10;
const PATIENT_ID: i64 = 20;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn time(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").unwrap()
}

fn api_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "email": "pat@example.com", "password": "secret-password" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "User logged in successfully",
            "token": "patient-token",
            "role": "Patient",
            "id": PATIENT_ID
        })))
        .mount(server)
        .await;
}

async fn logged_in_client(server: &MockServer) -> BookingClient {
    mount_login(server).await;
    let client = BookingClient::new(&api_url(server), Arc::new(EphemeralCredentialStore::new()));
    client.login("pat@example.com", "secret-password").await.unwrap();
    client
}

// Monday 2024-05-06, available 09:00-11:00, 09:30 already taken.
async fn mount_schedule(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/doctor/availability"))
        .and(query_param("doctorId", "10"))
        .and(header("Authorization", "Bearer patient-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::recurring_availability_row(1, DOCTOR_ID, "2024-05-01", "2024-05-31", "Monday", "09:00", "11:00")
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/doctor/consultations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::consultation_row(5, DOCTOR_ID, 99, "2024-05-06", "09:30", "10:00", "Booked")
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/doctor/absences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

fn draft(start: &str, duration_minutes: u32) -> BookingDraft {
    BookingDraft {
        doctor_id: DOCTOR_ID,
        patient_id: PATIENT_ID,
        date: date("2024-05-06"),
        start: time(start),
        duration_minutes,
        kind: "First Visit".to_string(),
        notes: None,
    }
}

#[tokio::test]
async fn test_login_keeps_token_in_ephemeral_store() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let store = Arc::new(EphemeralCredentialStore::new());
    let client = BookingClient::new(&api_url(&server), store.clone());
    let credential = client.login("pat@example.com", "secret-password").await.unwrap();

    assert_eq!(credential.user_id, PATIENT_ID);
    assert_eq!(store.load().await.unwrap(), Some(credential));
    assert_eq!(client.store().persistence(), CredentialPersistence::Ephemeral);

    client.logout().await.unwrap();
    assert_eq!(client.current_credential().await.unwrap(), None);
}

#[tokio::test]
async fn test_durable_login_survives_new_client() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/user/info"))
        .and(header("Authorization", "Bearer patient-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": PATIENT_ID,
            "name": "Jan",
            "lastName": "Kowalski",
            "email": "pat@example.com",
            "role": "Patient"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("credential.json");

    let first = BookingClient::new(&api_url(&server), Arc::new(FileCredentialStore::new(&file)));
    first.login("pat@example.com", "secret-password").await.unwrap();

    let second = BookingClient::new(&api_url(&server), Arc::new(FileCredentialStore::new(&file)));
    let profile = second.user_info().await.unwrap();
    assert_eq!(profile.id, PATIENT_ID);
    assert_eq!(profile.last_name, "Kowalski");
}

#[tokio::test]
async fn test_protected_calls_need_login() {
    let server = MockServer::start().await;
    let client = BookingClient::new(&api_url(&server), Arc::new(EphemeralCredentialStore::new()));

    assert_matches!(client.user_info().await, Err(ClientError::NotLoggedIn));
    assert_matches!(client.checkout(PATIENT_ID).await, Err(ClientError::NotLoggedIn));
}

#[tokio::test]
async fn test_schedule_is_projected_locally() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    mount_schedule(&server).await;

    let grid = client
        .schedule(DOCTOR_ID, date("2024-05-06"), date("2024-05-07"))
        .await
        .unwrap();

    assert_eq!(grid.len(), 2);
    let monday = &grid[0];
    assert_eq!(monday.slots.len(), 48);
    assert_eq!(monday.slot_at(time("09:00")).unwrap().status, SlotStatus::Available);
    assert_eq!(monday.slot_at(time("09:30")).unwrap().status, SlotStatus::Booked);
    assert_eq!(monday.slot_at(time("11:00")).unwrap().status, SlotStatus::Cancelled);
    assert!(grid[1].slots.iter().all(|slot| !slot.is_available()));
}

#[tokio::test]
async fn test_schedule_rejects_inverted_range_without_requests() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.schedule(DOCTOR_ID, date("2024-05-07"), date("2024-05-06")).await;
    assert_matches!(result, Err(ClientError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_book_posts_computed_end_time() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    mount_schedule(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/consultations"))
        .and(body_json(json!({
            "doctor_id": DOCTOR_ID,
            "patient_id": PATIENT_ID,
            "date": "2024-05-06",
            "start_time": "10:00",
            "end_time": "11:00",
            "type": "First Visit",
            "status": "Booked"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 77 })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client.book(&draft("10:00", 60)).await.unwrap();
    assert_eq!(id, 77);
}

#[tokio::test]
async fn test_book_precheck_rejects_without_post() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    mount_schedule(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/consultations"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
        .expect(0)
        .mount(&server)
        .await;

    let overlapping = client.book(&draft("09:00", 60)).await;
    assert_matches!(overlapping, Err(ClientError::Booking(SlotRunError::Unavailable(_))));

    let misaligned = client.book(&draft("10:00", 45)).await;
    assert_matches!(misaligned, Err(ClientError::Booking(SlotRunError::InvalidDuration(45))));
}

#[tokio::test]
async fn test_server_conflict_surfaces_as_api_error() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    mount_schedule(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/consultations"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "Selected slots are not all available"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let error = client.book(&draft("10:00", 30)).await.unwrap_err();
    assert!(error.is_conflict());
    assert_matches!(error, ClientError::Api { status: 409, ref message } if message.contains("not all available"));
}

#[tokio::test]
async fn test_checkout_and_cancel() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/patient/checkout"))
        .and(body_json(json!({ "patientID": PATIENT_ID })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Payment completed",
            "updated": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/consultations/5"))
        .and(body_json(json!({ "patient_id": PATIENT_ID })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Consultation cancelled" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/consultations/6"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": "Not your consultation" })))
        .mount(&server)
        .await;

    assert_eq!(client.checkout(PATIENT_ID).await.unwrap(), 2);
    client.cancel(5, PATIENT_ID).await.unwrap();

    let error = client.cancel(6, PATIENT_ID).await.unwrap_err();
    assert_eq!(error.status(), Some(403));
}

#[tokio::test]
async fn test_checkout_reply_without_count_is_an_error() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/patient/checkout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Payment completed" })))
        .expect(1)
        .mount(&server)
        .await;

    assert_matches!(client.checkout(PATIENT_ID).await, Err(ClientError::Serde(_)));
}
