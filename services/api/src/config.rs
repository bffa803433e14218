//! services/api/src/config.rs
//!
//! Defines the service's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use course_forge_core::PipelineConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub allowed_origin: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub pipeline: PipelineConfig,
}

/// Reads an optional numeric variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Provider Settings (key checked at startup) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty());

        // --- Load Pipeline Settings ---
        let defaults = PipelineConfig::default();
        let primary_model =
            std::env::var("PRIMARY_MODEL").unwrap_or_else(|_| defaults.primary_model.clone());
        // An explicitly empty FALLBACK_MODEL disables the fallback retry.
        let fallback_model = match std::env::var("FALLBACK_MODEL") {
            Ok(model) if model.trim().is_empty() => None,
            Ok(model) => Some(model),
            Err(_) => defaults.fallback_model.clone(),
        };

        let pipeline = PipelineConfig {
            primary_model,
            fallback_model,
            max_context_tokens: parse_var("MAX_CONTEXT_TOKENS", defaults.max_context_tokens)?,
            chunk_size_chars: parse_var("CHUNK_SIZE_CHARS", defaults.chunk_size_chars)?,
            lesson_source_chars: parse_var("LESSON_SOURCE_CHARS", defaults.lesson_source_chars)?,
            default_max_questions: parse_var(
                "DEFAULT_MAX_QUESTIONS",
                defaults.default_max_questions,
            )?,
            ..defaults
        };
        if pipeline.chunk_size_chars == 0 {
            return Err(ConfigError::InvalidValue(
                "CHUNK_SIZE_CHARS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            log_level,
            allowed_origin,
            openai_api_key,
            openai_base_url,
            pipeline,
        })
    }
}
