use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::schedule::{minute_of_day, Consultation, ConsultationStatus};

use crate::models::BookingError;
use crate::services::booking::CONSULTATIONS;

/// Instant at which a consultation ends; an end at or before the start falls on the next day.
pub fn end_instant(consultation: &Consultation) -> NaiveDateTime {
    let end = consultation.date.and_time(consultation.end_time);
    if minute_of_day(consultation.end_time) <= minute_of_day(consultation.start_time) {
        end + ChronoDuration::days(1)
    } else {
        end
    }
}

pub fn is_completable(consultation: &Consultation, now: NaiveDateTime) -> bool {
    matches!(consultation.status, ConsultationStatus::Booked | ConsultationStatus::Paid)
        && end_instant(consultation) <= now
}

/// Moves finished consultations to `Completed`.
pub struct ConsultationLifecycleService {
    supabase: SupabaseClient,
}

impl ConsultationLifecycleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn complete_elapsed(&self, now: NaiveDateTime) -> Result<usize, BookingError> {
        let query = format!(
            "status=in.({},{})&date=lte.{}&select=*",
            ConsultationStatus::Booked,
            ConsultationStatus::Paid,
            now.date()
        );
        let candidates: Vec<Consultation> = self.supabase.select(CONSULTATIONS, &query).await?;

        let ids: Vec<String> = candidates
            .iter()
            .filter(|c| is_completable(c, now))
            .map(|c| c.id.to_string())
            .collect();

        if ids.is_empty() {
            debug!("No consultations ended before {}", now);
            return Ok(0);
        }

        let filter = format!("id=in.({})", ids.join(","));
        let updated: Vec<Consultation> = self
            .supabase
            .update(CONSULTATIONS, &filter, json!({ "status": ConsultationStatus::Completed }))
            .await?;

        info!("Marked {} consultations as Completed", updated.len());
        Ok(updated.len())
    }
}

/// Runs the completion sweep every `completion_sweep_secs`; `None` when disabled.
pub fn spawn_completion_sweep(config: Arc<AppConfig>) -> Option<JoinHandle<()>> {
    if !config.is_completion_sweep_enabled() {
        info!("Completion sweep disabled");
        return None;
    }

    let period = Duration::from_secs(config.completion_sweep_secs);
    Some(tokio::spawn(async move {
        let service = ConsultationLifecycleService::new(&config);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Completion sweep running every {}s", period.as_secs());

        loop {
            ticker.tick().await;
            if let Err(e) = service.complete_elapsed(Local::now().naive_local()).await {
                error!("Completion sweep failed: {}", e);
            }
        }
    }))
}
