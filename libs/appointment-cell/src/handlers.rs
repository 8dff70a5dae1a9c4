use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Local;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_owner, require_role};

use crate::models::{CancelConsultationRequest, CheckoutRequest, CreateConsultationRequest, PatientQuery};
use crate::services::{booking::BookingService, lifecycle::ConsultationLifecycleService};

#[axum::debug_handler]
pub async fn create_consultation(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    WithRejection(Json(request), _): WithRejection<Json<CreateConsultationRequest>, AppError>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_owner(&user, request.patient_id, Role::Patient, "book for this patient")?;

    let consultation = BookingService::new(&state).book(request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": consultation.id }))))
}

#[axum::debug_handler]
pub async fn cancel_consultation(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    WithRejection(Path(consultation_id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(request), _): WithRejection<Json<CancelConsultationRequest>, AppError>,
) -> Result<Json<Value>, AppError> {
    require_owner(&user, request.patient_id, Role::Patient, "cancel for this patient")?;

    BookingService::new(&state)
        .cancel(consultation_id, request.patient_id)
        .await?;

    Ok(Json(json!({ "message": "Consultation cancelled" })))
}

#[axum::debug_handler]
pub async fn get_patient_consultations(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    WithRejection(Query(query), _): WithRejection<Query<PatientQuery>, AppError>,
) -> Result<Json<Value>, AppError> {
    require_owner(&user, query.patient_id, Role::Patient, "view this patient's consultations")?;

    let consultations = BookingService::new(&state)
        .list_for_patient(query.patient_id)
        .await?;

    Ok(Json(json!(consultations)))
}

#[axum::debug_handler]
pub async fn checkout(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    WithRejection(Json(request), _): WithRejection<Json<CheckoutRequest>, AppError>,
) -> Result<Json<Value>, AppError> {
    require_owner(&user, request.patient_id, Role::Patient, "check out for this patient")?;

    let updated = BookingService::new(&state).checkout(request.patient_id).await?;

    Ok(Json(json!({
        "message": "Payment completed",
        "updated": updated
    })))
}

#[axum::debug_handler]
pub async fn complete_elapsed(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Admin])?;

    let completed = ConsultationLifecycleService::new(&state)
        .complete_elapsed(Local::now().naive_local())
        .await?;

    Ok(Json(json!({ "completed": completed })))
}
