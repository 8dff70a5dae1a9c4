use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use doctor_cell::services::projector::{check_slot_run, project_schedule, validate_range};
use shared_models::auth::{Role, UserProfile};
use shared_models::schedule::{
    hhmm, Absence, AvailabilityWindow, Consultation, DaySchedule,
};

use crate::credentials::{Credential, CredentialStore};
use crate::error::ClientError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DoctorEntry {
    pub id: i64,
    pub name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
}

/// A booking as the patient picks it: a start cell plus a duration.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: u32,
    pub kind: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConsultationBody<'a> {
    doctor_id: i64,
    patient_id: i64,
    date: NaiveDate,
    #[serde(with = "hhmm")]
    start_time: NaiveTime,
    #[serde(with = "hhmm")]
    end_time: NaiveTime,
    #[serde(rename = "type")]
    kind: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LoginReply {
    token: String,
    role: Role,
    id: i64,
}

#[derive(Debug, Deserialize)]
struct CreatedReply {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct CheckoutReply {
    updated: u64,
}

pub struct BookingClient {
    http: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
}

impl BookingClient {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: &str, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    // ==========================================================================
    // ACCOUNT
    // ==========================================================================

    pub async fn register(&self, form: &RegisterForm) -> Result<i64, ClientError> {
        let reply: CreatedReply = self
            .send(self.request(Method::POST, "/register").json(form))
            .await?;
        Ok(reply.id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, ClientError> {
        let reply: LoginReply = self
            .send(
                self.request(Method::POST, "/login")
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        let credential = Credential {
            token: reply.token,
            role: reply.role,
            user_id: reply.id,
        };
        self.store.save(&credential).await?;
        info!("Logged in as user {} ({:?} credentials)", credential.user_id, self.store.persistence());
        Ok(credential)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.store.clear().await
    }

    pub async fn current_credential(&self) -> Result<Option<Credential>, ClientError> {
        self.store.load().await
    }

    pub async fn user_info(&self) -> Result<UserProfile, ClientError> {
        let request = self.authorized(Method::GET, "/user/info").await?;
        self.send(request).await
    }

    pub async fn doctors(&self) -> Result<Vec<DoctorEntry>, ClientError> {
        self.send(self.request(Method::GET, "/doctors")).await
    }

    // ==========================================================================
    // SCHEDULE
    // ==========================================================================

    /// Fetches the three raw lists concurrently and projects them locally.
    pub async fn schedule(
        &self,
        doctor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DaySchedule>, ClientError> {
        validate_range(start, end).map_err(ClientError::InvalidRequest)?;
        let query = [
            ("doctorId", doctor_id.to_string()),
            ("startDate", start.to_string()),
            ("endDate", end.to_string()),
        ];

        let (availability, consultations, absences) = futures::try_join!(
            self.fetch::<Vec<AvailabilityWindow>>("/doctor/availability", &query),
            self.fetch::<Vec<Consultation>>("/doctor/consultations", &query),
            self.fetch::<Vec<Absence>>("/doctor/absences", &query),
        )?;
        debug!(
            "Projecting {} windows, {} consultations, {} absences",
            availability.len(),
            consultations.len(),
            absences.len()
        );

        Ok(project_schedule(doctor_id, start, end, &availability, &consultations, &absences))
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    /// Pre-checks the run against a fresh projection, then posts it.
    pub async fn book(&self, draft: &BookingDraft) -> Result<i64, ClientError> {
        if draft.kind.trim().is_empty() {
            return Err(ClientError::InvalidRequest("Consultation type is required".to_string()));
        }

        let grid = self.schedule(draft.doctor_id, draft.date, draft.date).await?;
        let end_time = match check_slot_run(&grid, draft.date, draft.start, draft.duration_minutes) {
            Ok(end_time) => end_time,
            Err(e) => {
                warn!("Booking pre-check failed: {}", e);
                return Err(e.into());
            }
        };

        let body = ConsultationBody {
            doctor_id: draft.doctor_id,
            patient_id: draft.patient_id,
            date: draft.date,
            start_time: draft.start,
            end_time,
            kind: draft.kind.trim(),
            status: "Booked",
            notes: draft.notes.as_deref(),
        };

        let request = self.authorized(Method::POST, "/consultations").await?.json(&body);
        let reply: CreatedReply = self.send(request).await?;
        info!("Booked consultation {}", reply.id);
        Ok(reply.id)
    }

    pub async fn cancel(&self, consultation_id: i64, patient_id: i64) -> Result<(), ClientError> {
        let request = self
            .authorized(Method::DELETE, &format!("/consultations/{}", consultation_id))
            .await?
            .json(&json!({ "patient_id": patient_id }));
        let _: Value = self.send(request).await?;
        Ok(())
    }

    pub async fn patient_consultations(&self, patient_id: i64) -> Result<Vec<Consultation>, ClientError> {
        self.fetch("/patient/consultations", &[("patientId", patient_id.to_string())])
            .await
    }

    /// Pays every Booked consultation of the patient; returns how many changed.
    pub async fn checkout(&self, patient_id: i64) -> Result<u64, ClientError> {
        let request = self
            .authorized(Method::POST, "/patient/checkout")
            .await?
            .json(&json!({ "patientID": patient_id }));
        let reply: CheckoutReply = self.send(request).await?;
        Ok(reply.updated)
    }

    // ==========================================================================
    // TRANSPORT
    // ==========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let credential = self.store.load().await?.ok_or(ClientError::NotLoggedIn)?;
        Ok(self.request(method, path).bearer_auth(credential.token))
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ClientError> {
        let request = self.authorized(Method::GET, path).await?.query(query);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}
