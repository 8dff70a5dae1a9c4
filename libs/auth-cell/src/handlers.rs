use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{User, UserProfile};
use shared_models::error::AppError;

use crate::models::{LoginRequest, LoginResponse, RegisterRequest};
use crate::services::AccountService;

#[axum::debug_handler]
pub async fn register(
    State(config): State<Arc<AppConfig>>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let profile = AccountService::new(&config).register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "id": profile.id
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AccountService::new(&config).login(request).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn user_info(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = AccountService::new(&config).profile(user.id).await?;
    Ok(Json(profile))
}

/// Echoes the identity carried by a valid token.
pub async fn verify_token(Extension(user): Extension<User>) -> Json<Value> {
    Json(json!({
        "id": user.id,
        "role": user.role,
        "email": user.email
    }))
}
