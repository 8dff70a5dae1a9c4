use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::{eq, SupabaseClient};
use shared_models::schedule::AvailabilityWindow;

use crate::models::{AvailabilityRequest, ScheduleError};

const TABLE: &str = "doctor_availabilities";

pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Windows whose date range intersects `[start, end]`.
    pub async fn list_for_range(
        &self,
        doctor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityWindow>, ScheduleError> {
        debug!("Fetching availability for doctor {} between {} and {}", doctor_id, start, end);

        let query = format!(
            "doctor_id={}&start_date=lte.{}&end_date=gte.{}&order=start_date.asc,start_time.asc",
            eq(doctor_id),
            end,
            start
        );
        Ok(self.supabase.select(TABLE, &query).await?)
    }

    /// Stores every time slot of the request in one bulk insert.
    pub async fn create(&self, request: AvailabilityRequest) -> Result<Vec<AvailabilityWindow>, ScheduleError> {
        let doctor_id = request.doctor_id();
        let windows = request.into_windows()?;
        debug!("Creating {} availability windows for doctor {}", windows.len(), doctor_id);

        let created: Vec<AvailabilityWindow> = self.supabase.insert(TABLE, json!(windows)).await?;
        if created.is_empty() {
            return Err(ScheduleError::EmptyInsert(TABLE));
        }

        info!("Doctor {} now has {} new availability windows", doctor_id, created.len());
        Ok(created)
    }
}
