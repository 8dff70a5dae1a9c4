use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use doctor_cell::router::doctor_routes;
use shared_config::AppConfig;
use user_cell::router::user_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let api = Router::new()
        .merge(auth_routes(state.clone()))
        .merge(user_routes(state.clone()))
        .merge(doctor_routes(state.clone()))
        .merge(appointment_routes(state));

    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/api", api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

    async fn status_of(uri: &str, auth: Option<String>) -> StatusCode {
        let config = TestConfig::default();
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        create_router(config.to_arc())
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_liveness_route() {
        assert_eq!(status_of("/", None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cells_are_mounted_under_api() {
        assert_eq!(status_of("/api/user/info", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/api/doctor/schedule?doctorId=1&startDate=2024-05-01&endDate=2024-05-02", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/api/patient/consultations?patientId=1", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/user/info", None).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_verify_token_through_full_router() {
        let config = TestConfig::default();
        let auth = JwtTestUtils::bearer(&TestUser::patient(3), &config);
        assert_eq!(status_of("/api/verifyToken", Some(auth)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_api_path_is_not_found() {
        assert_eq!(status_of("/api/nowhere", None).await, StatusCode::NOT_FOUND);
    }
}
