use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use tracing::warn;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_owner, require_role};

use crate::models::{redact_notes, AvailabilityRequest, CreateAbsenceRequest, DoctorQuery, DoctorRangeQuery};
use crate::services::{
    absence::AbsenceService,
    availability::AvailabilityService,
    projector::validate_range,
    schedule::ScheduleService,
};

fn checked_range(query: &DoctorRangeQuery) -> Result<(), AppError> {
    validate_range(query.start_date, query.end_date).map_err(AppError::BadRequest)
}

// ==============================================================================
// READS (ANY AUTHENTICATED USER)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    WithRejection(Query(query), _): WithRejection<Query<DoctorRangeQuery>, AppError>,
) -> Result<Json<Value>, AppError> {
    checked_range(&query)?;
    let windows = AvailabilityService::new(&state)
        .list_for_range(query.doctor_id, query.start_date, query.end_date)
        .await?;

    Ok(Json(json!(windows)))
}

#[axum::debug_handler]
pub async fn get_consultations(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    WithRejection(Query(query), _): WithRejection<Query<DoctorRangeQuery>, AppError>,
) -> Result<Json<Value>, AppError> {
    checked_range(&query)?;
    let mut consultations = ScheduleService::new(&state)
        .consultations_for_range(query.doctor_id, query.start_date, query.end_date)
        .await?;
    redact_notes(&user, &mut consultations);

    Ok(Json(json!(consultations)))
}

#[axum::debug_handler]
pub async fn get_absences(
    State(state): State<Arc<AppConfig>>,
    WithRejection(Query(query), _): WithRejection<Query<DoctorRangeQuery>, AppError>,
) -> Result<Json<Value>, AppError> {
    checked_range(&query)?;
    let absences = AbsenceService::new(&state)
        .list_for_range(query.doctor_id, query.start_date, query.end_date)
        .await?;

    Ok(Json(json!(absences)))
}

#[axum::debug_handler]
pub async fn get_all_absences(
    State(state): State<Arc<AppConfig>>,
    WithRejection(Query(query), _): WithRejection<Query<DoctorQuery>, AppError>,
) -> Result<Json<Value>, AppError> {
    let absences = AbsenceService::new(&state).list_all(query.doctor_id).await?;
    Ok(Json(json!(absences)))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppConfig>>,
    WithRejection(Query(query), _): WithRejection<Query<DoctorRangeQuery>, AppError>,
) -> Result<Json<Value>, AppError> {
    let days = ScheduleService::new(&state)
        .project(query.doctor_id, query.start_date, query.end_date)
        .await?;

    Ok(Json(json!(days)))
}

// ==============================================================================
// DOCTOR-SCOPED WRITES
// ==============================================================================

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    WithRejection(Json(request), _): WithRejection<Json<AvailabilityRequest>, AppError>,
) -> Result<Json<Value>, AppError> {
    require_owner(&user, request.doctor_id(), Role::Doctor, "edit this doctor's availability")?;

    let created = AvailabilityService::new(&state).create(request).await?;

    Ok(Json(json!({
        "message": "Availability saved successfully!",
        "created": created.len()
    })))
}

#[axum::debug_handler]
pub async fn create_absence(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    WithRejection(Json(request), _): WithRejection<Json<CreateAbsenceRequest>, AppError>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_owner(&user, request.doctor_id, Role::Doctor, "record absences for this doctor")?;

    let absence = AbsenceService::new(&state).create(request).await?;
    Ok((StatusCode::CREATED, Json(json!(absence))))
}

#[axum::debug_handler]
pub async fn delete_absence(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    WithRejection(Path(absence_id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let service = AbsenceService::new(&state);
    let absence = service.get(absence_id).await?;

    if let Err(e) = require_owner(&user, absence.doctor_id, Role::Doctor, "remove this absence") {
        warn!("User {} tried to remove absence {} of doctor {}", user.id, absence.id, absence.doctor_id);
        return Err(e);
    }

    service.delete(absence_id).await?;
    Ok(Json(json!({ "message": "Absence removed" })))
}
