use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};
use user_cell::router::user_routes;

fn app(config: &TestConfig) -> Router {
    user_routes(config.to_arc())
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    auth: Option<String>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = auth {
        builder = builder.header("Authorization", value);
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn profile(id: i64, role: &str) -> Value {
    json!({
        "id": id,
        "name": "Anna",
        "last_name": format!("Nowak{}", id),
        "email": format!("anna{}@example.com", id),
        "role": role
    })
}

#[tokio::test]
async fn test_doctor_directory_is_public() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("role", "eq.Doctor"))
        .and(query_param("select", "id,name,last_name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 10, "name": "Anna", "last_name": "Nowak" },
            { "id": 11, "name": "Piotr", "last_name": "Zielinski" }
        ])))
        .mount(&mock_server)
        .await;

    let (status, body) = send(app(&config), "GET", "/doctors", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([
        { "id": 10, "name": "Anna", "lastName": "Nowak" },
        { "id": 11, "name": "Piotr", "lastName": "Zielinski" }
    ]));
}

#[tokio::test]
async fn test_user_listing_requires_admin() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile(1, "Admin"),
            profile(10, "Doctor")
        ])))
        .mount(&mock_server)
        .await;

    let (status, _) = send(app(&config), "GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let doctor = JwtTestUtils::bearer(&TestUser::doctor(10), &config);
    let (status, _) = send(app(&config), "GET", "/users", Some(doctor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = JwtTestUtils::bearer(&TestUser::admin(1), &config);
    let (status, body) = send(app(&config), "GET", "/users", Some(admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[1]["lastName"], "Nowak10");
}

#[tokio::test]
async fn test_admin_changes_role() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", "eq.20"))
        .and(body_json(json!({ "role": "Doctor" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([profile(20, "Doctor")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let admin = JwtTestUtils::bearer(&TestUser::admin(1), &config);
    let (status, body) = send(
        app(&config),
        "PATCH",
        "/users/20/role",
        Some(admin),
        Some(json!({ "role": "doctor" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "Doctor");
}

#[tokio::test]
async fn test_role_change_rejections() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let patient = JwtTestUtils::bearer(&TestUser::patient(20), &config);
    let (status, _) = send(
        app(&config),
        "PATCH",
        "/users/20/role",
        Some(patient),
        Some(json!({ "role": "Admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = JwtTestUtils::bearer(&TestUser::admin(1), &config);
    let (status, _) = send(
        app(&config),
        "PATCH",
        "/users/20/role",
        Some(admin.clone()),
        Some(json!({ "role": "Nurse" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        app(&config),
        "PATCH",
        "/users/twenty/role",
        Some(admin.clone()),
        Some(json!({ "role": "Doctor" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        app(&config),
        "PATCH",
        "/users/404/role",
        Some(admin),
        Some(json!({ "role": "Doctor" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
