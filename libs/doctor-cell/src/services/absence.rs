use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::{eq, SupabaseClient};
use shared_models::schedule::Absence;

use crate::models::{CreateAbsenceRequest, ScheduleError};

const TABLE: &str = "doctor_absences";

pub struct AbsenceService {
    supabase: SupabaseClient,
}

impl AbsenceService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_for_range(
        &self,
        doctor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Absence>, ScheduleError> {
        debug!("Fetching absences for doctor {} between {} and {}", doctor_id, start, end);

        let query = format!(
            "doctor_id={}&start_date=lte.{}&end_date=gte.{}&order=start_date.asc",
            eq(doctor_id),
            end,
            start
        );
        Ok(self.supabase.select(TABLE, &query).await?)
    }

    pub async fn list_all(&self, doctor_id: i64) -> Result<Vec<Absence>, ScheduleError> {
        let query = format!("doctor_id={}&order=start_date.asc", eq(doctor_id));
        Ok(self.supabase.select(TABLE, &query).await?)
    }

    pub async fn get(&self, absence_id: i64) -> Result<Absence, ScheduleError> {
        let rows: Vec<Absence> = self.supabase.select(TABLE, &format!("id={}", eq(absence_id))).await?;
        rows.into_iter().next().ok_or(ScheduleError::AbsenceNotFound(absence_id))
    }

    pub async fn create(&self, request: CreateAbsenceRequest) -> Result<Absence, ScheduleError> {
        request.validate()?;

        let body = json!({
            "doctor_id": request.doctor_id,
            "start_date": request.start_date,
            "end_date": request.end_date,
            "reason": request.reason.filter(|reason| !reason.trim().is_empty()),
        });

        let created: Vec<Absence> = self.supabase.insert(TABLE, body).await?;
        let absence = created.into_iter().next().ok_or(ScheduleError::EmptyInsert(TABLE))?;

        info!(
            "Doctor {} marked absent from {} to {}",
            absence.doctor_id, absence.start_date, absence.end_date
        );
        Ok(absence)
    }

    pub async fn delete(&self, absence_id: i64) -> Result<Absence, ScheduleError> {
        let removed: Vec<Absence> = self.supabase.delete(TABLE, &format!("id={}", eq(absence_id))).await?;
        let absence = removed.into_iter().next().ok_or(ScheduleError::AbsenceNotFound(absence_id))?;

        info!("Absence {} of doctor {} removed", absence.id, absence.doctor_id);
        Ok(absence)
    }
}
