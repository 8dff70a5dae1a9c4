use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/doctor/availability", get(handlers::get_availability))
        .route("/doctor/consultations", get(handlers::get_consultations))
        .route("/doctor/absences", get(handlers::get_absences))
        .route("/doctor/all-absences", get(handlers::get_all_absences))
        .route("/doctor/schedule", get(handlers::get_schedule))
        .route("/availability", post(handlers::create_availability))
        .route("/absences", post(handlers::create_absence))
        .route("/absences/{absence_id}", delete(handlers::delete_absence))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
