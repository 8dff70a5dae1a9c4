use std::sync::Arc;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Points storage at a mock server.
    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_minutes: 60,
            port: 5000,
            completion_sweep_secs: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(id: i64, role: Role) -> Self {
        Self {
            id,
            email: unique_email(&role.to_string().to_lowercase()),
            role,
        }
    }

    pub fn doctor(id: i64) -> Self {
        Self::new(id, Role::Doctor)
    }

    pub fn patient(id: i64) -> Self {
        Self::new(id, Role::Patient)
    }

    pub fn admin(id: i64) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: Some(self.email.clone()),
            role: self.role,
            created_at: Some(Utc::now()),
        }
    }
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4().simple())
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_minutes: Option<i64>) -> String {
        issue_token(
            user.id,
            &user.email,
            user.role,
            secret,
            Duration::minutes(exp_minutes.unwrap_or(60)),
        )
        .expect("test secret is not empty")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-5))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(60))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token".to_string()
    }

    pub fn bearer(user: &TestUser, config: &TestConfig) -> String {
        format!("Bearer {}", Self::create_test_token(user, &config.jwt_secret, Some(60)))
    }
}

/// Rows as PostgREST returns them (times carry seconds).
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_row(id: i64, email: &str, role: Role) -> serde_json::Value {
        json!({
            "id": id,
            "name": "Test",
            "last_name": format!("User{}", id),
            "email": email,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$invalid",
            "role": role.to_string()
        })
    }

    pub fn recurring_availability_row(
        id: i64,
        doctor_id: i64,
        start_date: &str,
        end_date: &str,
        days_mask: &str,
        start_time: &str,
        end_time: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "start_date": start_date,
            "end_date": end_date,
            "type": "Cyclic",
            "days_mask": days_mask,
            "start_time": format!("{}:00", start_time),
            "end_time": format!("{}:00", end_time)
        })
    }

    pub fn single_availability_row(
        id: i64,
        doctor_id: i64,
        date: &str,
        start_time: &str,
        end_time: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "start_date": date,
            "end_date": date,
            "type": "Single",
            "days_mask": "",
            "start_time": format!("{}:00", start_time),
            "end_time": format!("{}:00", end_time)
        })
    }

    pub fn consultation_row(
        id: i64,
        doctor_id: i64,
        patient_id: i64,
        date: &str,
        start_time: &str,
        end_time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "date": date,
            "start_time": format!("{}:00", start_time),
            "end_time": format!("{}:00", end_time),
            "type": "First Visit",
            "status": status,
            "notes": "Recurring headaches"
        })
    }

    pub fn absence_row(id: i64, doctor_id: i64, start_date: &str, end_date: &str) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "start_date": start_date,
            "end_date": end_date,
            "reason": "Conference"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
