use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DbError;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_models::schedule::{hhmm, AvailabilityKind, Consultation, WeekdaySet};

// ==============================================================================
// QUERY PARAMETERS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRangeQuery {
    pub doctor_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorQuery {
    pub doctor_id: i64,
}

// ==============================================================================
// AVAILABILITY REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotInput {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

/// Body of `POST /availability`, discriminated by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum AvailabilityRequest {
    #[serde(rename = "Cyclic", alias = "Recurring", rename_all = "camelCase")]
    Recurring {
        doctor_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        days_mask: WeekdaySet,
        time_slots: Vec<TimeSlotInput>,
    },
    #[serde(rename = "Single", alias = "SingleDay", rename_all = "camelCase")]
    SingleDay {
        doctor_id: i64,
        date: NaiveDate,
        time_slots: Vec<TimeSlotInput>,
    },
}

/// One window ready for insertion into `doctor_availabilities`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAvailabilityWindow {
    pub doctor_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: AvailabilityKind,
    pub days_mask: WeekdaySet,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl AvailabilityRequest {
    pub fn doctor_id(&self) -> i64 {
        match self {
            AvailabilityRequest::Recurring { doctor_id, .. }
            | AvailabilityRequest::SingleDay { doctor_id, .. } => *doctor_id,
        }
    }

    pub fn time_slots(&self) -> &[TimeSlotInput] {
        match self {
            AvailabilityRequest::Recurring { time_slots, .. }
            | AvailabilityRequest::SingleDay { time_slots, .. } => time_slots,
        }
    }

    /// Expands the request into one row per time slot.
    pub fn into_windows(self) -> Result<Vec<NewAvailabilityWindow>, ScheduleError> {
        let slots = self.time_slots();
        if slots.is_empty() {
            return Err(ScheduleError::InvalidAvailability(
                "At least one time slot is required".to_string(),
            ));
        }
        if let Some(slot) = slots.iter().find(|slot| slot.start == slot.end) {
            return Err(ScheduleError::InvalidAvailability(format!(
                "Time slot starting at {} has no length",
                slot.start.format("%H:%M")
            )));
        }

        let (doctor_id, start_date, end_date, kind, days_mask) = match &self {
            AvailabilityRequest::Recurring { doctor_id, start_date, end_date, days_mask, .. } => {
                if start_date > end_date {
                    return Err(ScheduleError::InvalidAvailability(
                        "startDate must not be after endDate".to_string(),
                    ));
                }
                if days_mask.is_empty() {
                    return Err(ScheduleError::InvalidAvailability(
                        "Select at least one weekday".to_string(),
                    ));
                }
                (*doctor_id, *start_date, *end_date, AvailabilityKind::Recurring, *days_mask)
            }
            AvailabilityRequest::SingleDay { doctor_id, date, .. } => {
                (*doctor_id, *date, *date, AvailabilityKind::SingleDay, WeekdaySet::empty())
            }
        };

        Ok(slots
            .iter()
            .map(|slot| NewAvailabilityWindow {
                doctor_id,
                start_date,
                end_date,
                kind,
                days_mask,
                start_time: slot.start,
                end_time: slot.end,
            })
            .collect())
    }
}

// ==============================================================================
// ABSENCES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAbsenceRequest {
    pub doctor_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

impl CreateAbsenceRequest {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.start_date > self.end_date {
            return Err(ScheduleError::InvalidAbsence(
                "startDate must not be after endDate".to_string(),
            ));
        }
        Ok(())
    }
}

// ==============================================================================
// CONSULTATION FEED
// ==============================================================================

/// Notes stay visible to the treating doctor, the patient and admins only.
pub fn redact_notes(viewer: &User, consultations: &mut [Consultation]) {
    for consultation in consultations.iter_mut() {
        let is_party = viewer.acts_as(consultation.doctor_id, Role::Doctor)
            || viewer.acts_as(consultation.patient_id, Role::Patient);
        if !is_party {
            consultation.notes = None;
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("{0}")]
    InvalidRange(String),

    #[error("Invalid availability: {0}")]
    InvalidAvailability(String),

    #[error("Invalid absence: {0}")]
    InvalidAbsence(String),

    #[error("Absence {0} not found")]
    AbsenceNotFound(i64),

    #[error("Storage returned no rows for {0}")]
    EmptyInsert(&'static str),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::InvalidRange(msg) => AppError::BadRequest(msg),
            ScheduleError::InvalidAvailability(_) | ScheduleError::InvalidAbsence(_) => {
                AppError::ValidationError(err.to_string())
            }
            ScheduleError::AbsenceNotFound(_) => AppError::NotFound(err.to_string()),
            ScheduleError::EmptyInsert(_) => AppError::Internal(err.to_string()),
            ScheduleError::Database(db) => db.into(),
        }
    }
}
