use thiserror::Error;

use doctor_cell::services::projector::SlotRunError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Booking rejected before sending: {0}")]
    Booking(#[from] SlotRunError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Credential store configuration: {0}")]
    Config(String),

    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed credential data: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}
