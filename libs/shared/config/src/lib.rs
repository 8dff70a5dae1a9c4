use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_COMPLETION_SWEEP_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub port: u16,
    pub completion_sweep_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            token_ttl_minutes: parse_or("TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES),
            port: parse_or("PORT", DEFAULT_PORT),
            completion_sweep_secs: parse_or("COMPLETION_SWEEP_SECS", DEFAULT_COMPLETION_SWEEP_SECS),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_completion_sweep_enabled(&self) -> bool {
        self.completion_sweep_secs > 0
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
