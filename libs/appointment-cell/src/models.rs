use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::models::ScheduleError;
use doctor_cell::services::projector::SlotRunError;
use shared_database::DbError;
use shared_models::error::AppError;
use shared_models::schedule::{hhmm, ConsultationStatus, TimeRange};

// ==============================================================================
// REQUESTS
// ==============================================================================

/// Wire form of a booking: `{doctor_id, patient_id, date, start_time, end_time, type, status?, notes?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConsultationRequest {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ConsultationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CreateConsultationRequest {
    /// Shape checks that need no storage access. Returns the duration in minutes.
    pub fn validate(&self) -> Result<u32, BookingError> {
        if self.kind.trim().is_empty() {
            return Err(BookingError::Validation("Consultation type is required".to_string()));
        }
        if let Some(status) = self.status {
            if status != ConsultationStatus::Booked {
                return Err(BookingError::Validation(format!(
                    "New consultations must be Booked, not {}",
                    status
                )));
            }
        }
        if self.start_time == self.end_time {
            return Err(BookingError::Validation("End time must be after start time".to_string()));
        }

        Ok(TimeRange::new(self.start_time, self.end_time).duration_minutes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelConsultationRequest {
    pub patient_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientQuery {
    #[serde(rename = "patientId")]
    pub patient_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "patientID", alias = "patientId")]
    pub patient_id: i64,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("Doctor {0} not found")]
    DoctorNotFound(i64),

    #[error("{0}")]
    SlotUnavailable(String),

    #[error("Consultation {0} not found")]
    ConsultationNotFound(i64),

    #[error("Not authorized to cancel this consultation")]
    NotOwner,

    #[error("Storage returned no consultation row")]
    NotStored,

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<SlotRunError> for BookingError {
    fn from(err: SlotRunError) -> Self {
        match err {
            SlotRunError::Unavailable(_) => BookingError::SlotUnavailable(err.to_string()),
            other => BookingError::Validation(other.to_string()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::DoctorNotFound(_) | BookingError::ConsultationNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            BookingError::SlotUnavailable(msg) => AppError::Conflict(msg),
            BookingError::NotOwner => AppError::Forbidden(err.to_string()),
            BookingError::NotStored => AppError::Internal(err.to_string()),
            BookingError::Schedule(e) => e.into(),
            BookingError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn request(start: &str, end: &str) -> CreateConsultationRequest {
        serde_json::from_value(json!({
            "doctor_id": 10,
            "patient_id": 20,
            "date": "2024-05-06",
            "start_time": start,
            "end_time": end,
            "type": "Checkup"
        }))
        .unwrap()
    }

    #[test]
    fn test_duration_is_derived_from_times() {
        assert_eq!(request("09:00", "10:00").validate().unwrap(), 60);
        assert_eq!(request("23:00", "00:00").validate().unwrap(), 60);
    }

    #[test]
    fn test_rejects_empty_range_and_type() {
        assert_matches!(request("09:00", "09:00").validate(), Err(BookingError::Validation(_)));

        let mut untyped = request("09:00", "10:00");
        untyped.kind = "  ".to_string();
        assert_matches!(untyped.validate(), Err(BookingError::Validation(_)));
    }

    #[test]
    fn test_rejects_non_booked_status() {
        let mut paid = request("09:00", "10:00");
        paid.status = Some(ConsultationStatus::Paid);
        assert_matches!(paid.validate(), Err(BookingError::Validation(_)));

        paid.status = Some(ConsultationStatus::Booked);
        assert!(paid.validate().is_ok());
    }

    #[test]
    fn test_checkout_accepts_both_spellings() {
        let upper: CheckoutRequest = serde_json::from_value(json!({ "patientID": 4 })).unwrap();
        let lower: CheckoutRequest = serde_json::from_value(json!({ "patientId": 4 })).unwrap();
        assert_eq!(upper.patient_id, lower.patient_id);
    }

    #[test]
    fn test_error_status_mapping() {
        let conflict: AppError = BookingError::from(SlotRunError::Unavailable(NaiveTime::MIN)).into();
        assert_matches!(conflict, AppError::Conflict(_));

        let misaligned: AppError = BookingError::from(SlotRunError::Misaligned(NaiveTime::MIN)).into();
        assert_matches!(misaligned, AppError::ValidationError(_));

        assert_matches!(AppError::from(BookingError::NotOwner), AppError::Forbidden(_));
        assert_matches!(AppError::from(BookingError::DoctorNotFound(3)), AppError::NotFound(_));
    }
}
