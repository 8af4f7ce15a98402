//! Configuration management
//!
//! Loads and validates configuration from environment variables, with support
//! for different environments (development, staging, production).

use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Which remote document store backs the sync engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    Gist,
    Supabase,
    /// In-process store for development and tests
    #[default]
    Memory,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "gist" => Ok(StoreBackend::Gist),
            "supabase" => Ok(StoreBackend::Supabase),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid store backend: '{}'. Expected: gist, supabase, or memory",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Gist => "gist",
            StoreBackend::Supabase => "supabase",
            StoreBackend::Memory => "memory",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote document store backend
    pub store_backend: StoreBackend,

    /// GitHub gist id holding the document (gist backend)
    pub gist_id: Option<String>,

    /// GitHub token with gist scope (gist backend; required for writes)
    pub gist_token: Option<String>,

    /// Supabase project base URL (supabase backend)
    pub supabase_url: Option<String>,

    /// Supabase anon or service key (supabase backend)
    pub supabase_key: Option<String>,

    /// Where the local document cache file lives
    pub cache_path: PathBuf,

    /// Where the local payment log lives
    pub payments_path: PathBuf,

    /// Background refresh interval in seconds
    pub sync_interval_secs: u64,

    /// PIX key quoted in collection reminder messages
    pub pix_key: String,

    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::from_str(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let store_backend = env::var("STORE_BACKEND")
            .map(|s| StoreBackend::from_str(&s))
            .unwrap_or(Ok(StoreBackend::Memory))?;

        let gist_id = env::var("GIST_ID").ok().filter(|s| !s.is_empty());
        let gist_token = env::var("GIST_TOKEN").ok().filter(|s| !s.is_empty());
        let supabase_url = env::var("SUPABASE_URL").ok().filter(|s| !s.is_empty());
        let supabase_key = env::var("SUPABASE_KEY").ok().filter(|s| !s.is_empty());

        if store_backend == StoreBackend::Gist && gist_id.is_none() {
            return Err(ConfigError::MissingEnvVar("GIST_ID".to_string()));
        }
        if store_backend == StoreBackend::Supabase && supabase_url.is_none() {
            return Err(ConfigError::MissingEnvVar("SUPABASE_URL".to_string()));
        }

        let cache_path = env::var("CACHE_PATH")
            .unwrap_or_else(|_| "data/document.json".to_string())
            .into();

        let payments_path = env::var("PAYMENTS_PATH")
            .unwrap_or_else(|_| "data/payments.json".to_string())
            .into();

        let sync_interval_secs = env::var("SYNC_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .unwrap_or(30)
            .max(1);

        let pix_key = env::var("PIX_KEY").unwrap_or_default();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            store_backend,
            gist_id,
            gist_token,
            supabase_url,
            supabase_key,
            cache_path,
            payments_path,
            sync_interval_secs,
            pix_key,
            environment,
            port,
            cors_allowed_origins,
            log_level,
        })
    }

    /// Gist token masked for logging
    pub fn gist_token_masked(&self) -> String {
        match &self.gist_token {
            // chars, not bytes: a slice could split a multi-byte character
            Some(token) if token.len() > 8 => {
                format!("{}****", token.chars().take(4).collect::<String>())
            }
            Some(_) => "****".to_string(),
            None => "<unset>".to_string(),
        }
    }
}
