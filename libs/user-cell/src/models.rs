use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DbError;
use shared_models::error::AppError;

/// Directory entry shown to patients picking a doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename(serialize = "lastName"), alias = "lastName")]
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Error, Debug)]
pub enum UserAdminError {
    #[error("{0}")]
    InvalidRole(String),

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<UserAdminError> for AppError {
    fn from(err: UserAdminError) -> Self {
        match err {
            UserAdminError::InvalidRole(msg) => AppError::ValidationError(msg),
            UserAdminError::UserNotFound(_) => AppError::NotFound(err.to_string()),
            UserAdminError::Database(e) => e.into(),
        }
    }
}
