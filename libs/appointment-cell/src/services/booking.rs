use serde_json::json;
use tracing::{debug, info, warn};

use doctor_cell::services::{projector::check_slot_run, ScheduleService};
use shared_config::AppConfig;
use shared_database::supabase::{eq, SupabaseClient};
use shared_database::DbError;
use shared_models::auth::Role;
use shared_models::schedule::{Consultation, ConsultationStatus};

use crate::models::{BookingError, CreateConsultationRequest};

pub(crate) const CONSULTATIONS: &str = "consultations";

pub struct BookingService {
    supabase: SupabaseClient,
    schedule: ScheduleService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            schedule: ScheduleService::new(config),
        }
    }

    /// Validates the run against the doctor's current grid and stores it as Booked.
    pub async fn book(&self, request: CreateConsultationRequest) -> Result<Consultation, BookingError> {
        let duration = request.validate()?;
        debug!(
            "Booking doctor {} for patient {} on {} at {} ({} min)",
            request.doctor_id, request.patient_id, request.date, request.start_time, duration
        );

        self.ensure_doctor(request.doctor_id).await?;

        let day = self.schedule.project_day(request.doctor_id, request.date).await?;
        if let Err(e) = check_slot_run(std::slice::from_ref(&day), request.date, request.start_time, duration) {
            warn!("Rejected booking for doctor {} on {}: {}", request.doctor_id, request.date, e);
            return Err(e.into());
        }

        let body = json!({
            "doctor_id": request.doctor_id,
            "patient_id": request.patient_id,
            "date": request.date,
            "start_time": request.start_time.format("%H:%M").to_string(),
            "end_time": request.end_time.format("%H:%M").to_string(),
            "type": request.kind.trim(),
            "status": ConsultationStatus::Booked,
            "notes": request.notes,
        });

        let created: Vec<Consultation> = match self.supabase.insert(CONSULTATIONS, body).await {
            Ok(rows) => rows,
            Err(DbError::Conflict { code, message }) => {
                warn!("Storage rejected overlapping booking ({}): {}", code, message);
                return Err(BookingError::SlotUnavailable(
                    "The selected slots were just booked by someone else".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let consultation = created
            .into_iter()
            .next()
            .ok_or(BookingError::NotStored)?;

        info!(
            "Consultation {} booked with doctor {} on {} {}-{}",
            consultation.id,
            consultation.doctor_id,
            consultation.date,
            consultation.start_time.format("%H:%M"),
            consultation.end_time.format("%H:%M")
        );
        Ok(consultation)
    }

    async fn ensure_doctor(&self, doctor_id: i64) -> Result<(), BookingError> {
        let query = format!("id={}&role={}&select=id", eq(doctor_id), eq(Role::Doctor));
        let rows: Vec<serde_json::Value> = self.supabase.select("users", &query).await?;
        if rows.is_empty() {
            return Err(BookingError::DoctorNotFound(doctor_id));
        }
        Ok(())
    }

    pub async fn get(&self, consultation_id: i64) -> Result<Consultation, BookingError> {
        let rows: Vec<Consultation> = self
            .supabase
            .select(CONSULTATIONS, &format!("id={}", eq(consultation_id)))
            .await?;
        rows.into_iter()
            .next()
            .ok_or(BookingError::ConsultationNotFound(consultation_id))
    }

    /// Deletes the consultation if it belongs to `patient_id`.
    pub async fn cancel(&self, consultation_id: i64, patient_id: i64) -> Result<Consultation, BookingError> {
        let consultation = self.get(consultation_id).await?;
        if consultation.patient_id != patient_id {
            warn!(
                "Patient {} tried to cancel consultation {} of patient {}",
                patient_id, consultation_id, consultation.patient_id
            );
            return Err(BookingError::NotOwner);
        }

        let query = format!("id={}&patient_id={}", eq(consultation_id), eq(patient_id));
        let removed: Vec<Consultation> = self.supabase.delete(CONSULTATIONS, &query).await?;
        let consultation = removed
            .into_iter()
            .next()
            .ok_or(BookingError::ConsultationNotFound(consultation_id))?;

        info!("Consultation {} cancelled by patient {}", consultation_id, patient_id);
        Ok(consultation)
    }

    pub async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Consultation>, BookingError> {
        let query = format!("patient_id={}&order=date.asc,start_time.asc", eq(patient_id));
        Ok(self.supabase.select(CONSULTATIONS, &query).await?)
    }

    /// Marks every Booked consultation of the patient as Paid.
    pub async fn checkout(&self, patient_id: i64) -> Result<usize, BookingError> {
        let query = format!(
            "patient_id={}&status={}",
            eq(patient_id),
            eq(ConsultationStatus::Booked)
        );
        let updated: Vec<Consultation> = self
            .supabase
            .update(CONSULTATIONS, &query, json!({ "status": ConsultationStatus::Paid }))
            .await?;

        info!("Checkout for patient {} paid {} consultations", patient_id, updated.len());
        Ok(updated.len())
    }
}
