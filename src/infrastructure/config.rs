use crate::infrastructure::logging::{LogFormat, UnknownLogFormat};
use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;
/// One year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_GRAMMAR_MODEL: &str = "vennify/t5-base-grammar-correction";
pub const DEFAULT_SUMMARY_MODEL: &str = "google/pegasus-xsum";
pub const DEFAULT_WRITING_MODEL: &str = "EleutherAI/gpt-neo-125M";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

/// Where the three text models are served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InferenceBackend {
    #[default]
    HuggingFace,
    /// Canned in-process responses, for running without model access.
    Mock,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub backend: InferenceBackend,
    pub base_url: String,
    pub api_token: Option<String>,
    pub grammar_model: String,
    pub summary_model: String,
    pub writing_model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub log_format: LogFormat,
    /// `None` runs the service on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub auth: AuthConfig,
    pub cors_origin: String,
    pub inference: InferenceConfig,
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let ttl_minutes = match get("TOKEN_TTL_MINUTES") {
            Some(raw) => parse_positive::<i64>("TOKEN_TTL_MINUTES", &raw)?,
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };
        let token_ttl = Duration::try_minutes(ttl_minutes)
            .filter(|_| ttl_minutes <= MAX_TOKEN_TTL_MINUTES)
            .ok_or_else(|| ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                reason: format!("must be at most {}", MAX_TOKEN_TTL_MINUTES),
            })?;

        let database = match get("DATABASE_URL") {
            Some(url) => {
                let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
                    Some(raw) => parse_positive::<u32>("DATABASE_MAX_CONNECTIONS", &raw)?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                Some(DatabaseConfig {
                    url,
                    max_connections,
                })
            }
            None => None,
        };

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw
                .parse()
                .map_err(|e: UnknownLogFormat| ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    reason: e.to_string(),
                })?,
            None => LogFormat::default(),
        };

        let backend = match get("INFERENCE_BACKEND").map(|v| v.to_ascii_lowercase()) {
            None => InferenceBackend::default(),
            Some(v) if v == "huggingface" => InferenceBackend::HuggingFace,
            Some(v) if v == "mock" => InferenceBackend::Mock,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "INFERENCE_BACKEND",
                    reason: format!("expected huggingface or mock, got {}", other),
                });
            }
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            log_format,
            database,
            auth: AuthConfig {
                jwt_secret,
                token_ttl,
            },
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            inference: InferenceConfig {
                backend,
                base_url: get("INFERENCE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_INFERENCE_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                api_token: get("INFERENCE_API_TOKEN"),
                grammar_model: get("GRAMMAR_MODEL")
                    .unwrap_or_else(|| DEFAULT_GRAMMAR_MODEL.to_string()),
                summary_model: get("SUMMARY_MODEL")
                    .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
                writing_model: get("WRITING_MODEL")
                    .unwrap_or_else(|| DEFAULT_WRITING_MODEL.to_string()),
            },
        })
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
