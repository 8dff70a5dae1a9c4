use std::fmt::Display;

use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Constraint violation ({code}): {message}")]
    Conflict { code: String, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => AppError::NotFound(msg),
            DbError::Conflict { message, .. } => AppError::Conflict(message),
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Builds a PostgREST equality filter value, e.g. `eq.jane%40example.com`.
pub fn eq(value: impl Display) -> String {
    format!("eq.{}", urlencoding::encode(&value.to_string()))
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self, extra: Option<HeaderMap>) -> Result<HeaderMap, DbError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|_| DbError::Config("service key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|_| DbError::Config("service key is not a valid header value".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(extra) = extra {
            headers.extend(extra);
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DbError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         body: Option<Value>, headers: Option<HeaderMap>)
                                         -> Result<T, DbError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers(headers)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);
            return Err(Self::classify_error(status, &text));
        }

        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(body)?)
    }

    fn classify_error(status: StatusCode, text: &str) -> DbError {
        let parsed: Option<Value> = serde_json::from_str(text).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let message = field("message").unwrap_or_else(|| text.to_string());

        match status.as_u16() {
            401 | 403 => DbError::Auth(message),
            404 => DbError::NotFound(message),
            409 => DbError::Conflict {
                code: field("code").unwrap_or_default(),
                message,
            },
            _ => DbError::Api { status, message },
        }
    }

    fn representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    fn table_path(table: &str, query: &str) -> String {
        if query.is_empty() {
            format!("/rest/v1/{}", table)
        } else {
            format!("/rest/v1/{}?{}", table, query)
        }
    }

    pub async fn select<T>(&self, table: &str, query: &str) -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        self.request(Method::GET, &Self::table_path(table, query), None).await
    }

    /// Inserts one object or an array of objects in a single statement.
    pub async fn insert<T>(&self, table: &str, body: Value) -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        self.request_with_headers(
            Method::POST,
            &Self::table_path(table, ""),
            Some(body),
            Some(Self::representation()),
        ).await
    }

    pub async fn update<T>(&self, table: &str, query: &str, body: Value) -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        self.request_with_headers(
            Method::PATCH,
            &Self::table_path(table, query),
            Some(body),
            Some(Self::representation()),
        ).await
    }

    /// Deletes matching rows and returns them.
    pub async fn delete<T>(&self, table: &str, query: &str) -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        self.request_with_headers(
            Method::DELETE,
            &Self::table_path(table, query),
            None,
            Some(Self::representation()),
        ).await
    }
}
