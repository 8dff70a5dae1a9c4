use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DbError;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::jwt::TokenError;

static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"));

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_EMAIL_LEN: usize = 254;

pub fn is_valid_email(email: &str) -> Result<bool, AccountError> {
    let re = EMAIL_RE
        .as_ref()
        .map_err(|e| AccountError::Pattern(e.to_string()))?;
    Ok(email.len() <= MAX_EMAIL_LEN && re.is_match(email))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AccountError> {
        if self.name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(AccountError::InvalidInput("Name and last name are required".to_string()));
        }
        if !is_valid_email(self.email.trim())? {
            return Err(AccountError::InvalidInput("Email address is not valid".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.role == Role::Admin {
            return Err(AccountError::AdminSelfRegistration);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Full `users` row including the credential hash. Never leaves this cell.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub role: Role,
    pub id: i64,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Admin accounts cannot be self-registered")]
    AdminSelfRegistration,

    #[error("User not found")]
    UnknownEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Storage returned no user row")]
    NotStored,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Email pattern failed to compile: {0}")]
    Pattern(String),

    #[error("Token issuance failed: {0}")]
    Token(#[from] TokenError),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<argon2::password_hash::Error> for AccountError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AccountError::PasswordHash(err.to_string())
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidInput(msg) => AppError::ValidationError(msg),
            AccountError::EmailTaken
            | AccountError::AdminSelfRegistration
            | AccountError::InvalidCredentials => AppError::BadRequest(err.to_string()),
            AccountError::UnknownEmail | AccountError::UserNotFound(_) => AppError::NotFound(err.to_string()),
            AccountError::NotStored
            | AccountError::PasswordHash(_)
            | AccountError::Pattern(_)
            | AccountError::Token(_) => {
                AppError::Internal(err.to_string())
            }
            AccountError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(email: &str, password: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            name: "Jan".to_string(),
            last_name: "Kowalski".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        }
    }

    #[test]
    fn test_email_pattern() {
        assert!(EMAIL_RE.is_ok());
        assert!(is_valid_email("jan.kowalski+clinic@example.co").unwrap());
        assert!(!is_valid_email("jan@localhost").unwrap());
        assert!(!is_valid_email("jan kowalski@example.com").unwrap());
        let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(!is_valid_email(&long).unwrap());
    }

    #[test]
    fn test_register_validation() {
        assert!(request("jan@example.com", "longenough", Role::Patient).validate().is_ok());
        assert_matches!(
            request("not-an-email", "longenough", Role::Patient).validate(),
            Err(AccountError::InvalidInput(_))
        );
        assert_matches!(
            request("jan@example.com", "short", Role::Doctor).validate(),
            Err(AccountError::InvalidInput(_))
        );
        assert_matches!(
            request("jan@example.com", "longenough", Role::Admin).validate(),
            Err(AccountError::AdminSelfRegistration)
        );
    }

    #[test]
    fn test_register_body_uses_camel_case() {
        let parsed: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "Jan", "lastName": "Kowalski", "email": "jan@example.com",
            "password": "longenough", "role": "Patient"
        }))
        .unwrap();
        assert_eq!(parsed.last_name, "Kowalski");
    }

    #[test]
    fn test_login_errors_map_to_source_statuses() {
        assert_matches!(AppError::from(AccountError::UnknownEmail), AppError::NotFound(_));
        assert_matches!(AppError::from(AccountError::InvalidCredentials), AppError::BadRequest(_));
        assert_matches!(AppError::from(AccountError::EmailTaken), AppError::BadRequest(_));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jan@Example.COM "), "jan@example.com");
    }
}
