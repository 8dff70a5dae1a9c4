use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/consultations", post(handlers::create_consultation))
        .route("/consultations/complete-elapsed", post(handlers::complete_elapsed))
        .route("/consultations/{consultation_id}", delete(handlers::cancel_consultation))
        .route("/patient/consultations", get(handlers::get_patient_consultations))
        .route("/patient/checkout", post(handlers::checkout))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
