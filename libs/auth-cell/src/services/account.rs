use chrono::Duration;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::{eq, SupabaseClient};
use shared_database::DbError;
use shared_models::auth::UserProfile;
use shared_utils::jwt::issue_token;

use crate::models::{normalize_email, AccountError, LoginRequest, LoginResponse, RegisterRequest, UserRecord};
use crate::services::password::{hash_password, verify_password};

const USERS: &str = "users";
const PROFILE_COLUMNS: &str = "id,name,last_name,email,role";

pub struct AccountService {
    supabase: SupabaseClient,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: Duration::minutes(config.token_ttl_minutes),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, AccountError> {
        request.validate()?;
        let email = normalize_email(&request.email);
        debug!("Registering {} as {}", email, request.role);

        let existing: Vec<serde_json::Value> = self
            .supabase
            .select(USERS, &format!("email={}&select=id", eq(&email)))
            .await?;
        if !existing.is_empty() {
            warn!("Registration rejected, email already in use");
            return Err(AccountError::EmailTaken);
        }

        let body = json!({
            "name": request.name.trim(),
            "last_name": request.last_name.trim(),
            "email": email,
            "password_hash": hash_password(&request.password)?,
            "role": request.role,
        });

        let created: Vec<UserProfile> = match self.supabase.insert(USERS, body).await {
            Ok(rows) => rows,
            // unique index on email lost a race
            Err(DbError::Conflict { .. }) => return Err(AccountError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        let profile = created
            .into_iter()
            .next()
            .ok_or(AccountError::NotStored)?;

        info!("User {} registered as {}", profile.id, profile.role);
        Ok(profile)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AccountError> {
        let email = normalize_email(&request.email);
        let query = format!("email={}&select=id,email,password_hash,role", eq(&email));
        let rows: Vec<UserRecord> = self.supabase.select(USERS, &query).await?;
        let record = rows.into_iter().next().ok_or(AccountError::UnknownEmail)?;

        if !verify_password(&request.password, &record.password_hash)? {
            warn!("Failed login for user {}", record.id);
            return Err(AccountError::InvalidCredentials);
        }

        let token = issue_token(record.id, &record.email, record.role, &self.jwt_secret, self.token_ttl)?;
        info!("User {} logged in", record.id);

        Ok(LoginResponse {
            message: "User logged in successfully".to_string(),
            token,
            role: record.role,
            id: record.id,
        })
    }

    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, AccountError> {
        let query = format!("id={}&select={}", eq(user_id), PROFILE_COLUMNS);
        let rows: Vec<UserProfile> = self.supabase.select(USERS, &query).await?;
        rows.into_iter().next().ok_or(AccountError::UserNotFound(user_id))
    }
}
