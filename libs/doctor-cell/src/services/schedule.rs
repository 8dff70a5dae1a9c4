use chrono::NaiveDate;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::{eq, SupabaseClient};
use shared_models::schedule::{Consultation, DaySchedule};

use crate::models::ScheduleError;
use crate::services::absence::AbsenceService;
use crate::services::availability::AvailabilityService;
use crate::services::projector::{project_schedule, validate_range};

const CONSULTATIONS: &str = "consultations";

/// Reads the three raw lists for a doctor and projects them into a slot grid.
pub struct ScheduleService {
    supabase: SupabaseClient,
    availability: AvailabilityService,
    absences: AbsenceService,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            availability: AvailabilityService::new(config),
            absences: AbsenceService::new(config),
        }
    }

    /// Consultations of a doctor dated within `[start, end]`, in calendar order.
    pub async fn consultations_for_range(
        &self,
        doctor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Consultation>, ScheduleError> {
        let query = format!(
            "doctor_id={}&date=gte.{}&date=lte.{}&order=date.asc,start_time.asc",
            eq(doctor_id),
            start,
            end
        );
        Ok(self.supabase.select(CONSULTATIONS, &query).await?)
    }

    pub async fn project(
        &self,
        doctor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DaySchedule>, ScheduleError> {
        validate_range(start, end).map_err(ScheduleError::InvalidRange)?;
        debug!("Projecting schedule of doctor {} from {} to {}", doctor_id, start, end);

        let (availability, consultations, absences) = tokio::try_join!(
            self.availability.list_for_range(doctor_id, start, end),
            self.consultations_for_range(doctor_id, start, end),
            self.absences.list_for_range(doctor_id, start, end),
        )?;

        Ok(project_schedule(doctor_id, start, end, &availability, &consultations, &absences))
    }

    /// Grid of a single date, read fresh from storage.
    pub async fn project_day(&self, doctor_id: i64, date: NaiveDate) -> Result<DaySchedule, ScheduleError> {
        let mut days = self.project(doctor_id, date, date).await?;
        days.pop().ok_or_else(|| ScheduleError::InvalidRange(format!("No schedule for {}", date)))
    }
}
