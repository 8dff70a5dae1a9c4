use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path, State},
};
use axum_extra::extract::WithRejection;

use shared_config::AppConfig;
use shared_models::auth::{Role, User, UserProfile};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{ChangeRoleRequest, DoctorSummary};
use crate::services::UserDirectoryService;

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Vec<DoctorSummary>>, AppError> {
    let doctors = UserDirectoryService::new(&state).list_doctors().await?;
    Ok(Json(doctors))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    require_role(&user, &[Role::Admin])?;

    let users = UserDirectoryService::new(&state).list_users().await?;
    Ok(Json(users))
}

#[axum::debug_handler]
pub async fn change_role(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    WithRejection(Path(user_id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(request), _): WithRejection<Json<ChangeRoleRequest>, AppError>,
) -> Result<Json<UserProfile>, AppError> {
    require_role(&user, &[Role::Admin])?;

    let profile = UserDirectoryService::new(&state)
        .change_role(user_id, &request.role)
        .await?;
    Ok(Json(profile))
}
