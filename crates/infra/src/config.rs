//! Configuration loading and representation.
//!
//! Everything is read through a lookup closure so parsing can be tested with a
//! plain map instead of mutating the process environment.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    fn parse(s: &str) -> Self {
        match s {
            "production" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

/// Store wiring passed explicitly into store constructors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Prepended to every table name (`cl_` gives `cl_goods`, ...).
    pub table_prefix: String,
}

impl StoreConfig {
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let table_prefix = prefix.into();
        if !table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::InvalidEnvVar {
                var: "CARTLINE_TABLE_PREFIX".to_string(),
                reason: "only [A-Za-z0-9_] allowed".to_string(),
            });
        }
        Ok(Self { table_prefix })
    }

    pub fn table(&self, name: &str) -> String {
        format!("{}{}", self.table_prefix, name)
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub store: StoreConfig,
    pub intent_ttl_secs: u64,
    pub jwt_secret: String,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[redacted]"))
            .field("store", &self.store)
            .field("intent_ttl_secs", &self.intent_ttl_secs)
            .field("jwt_secret", &"[redacted]")
            .finish()
    }
}

pub const DEFAULT_INTENT_TTL_SECS: u64 = 1800;
const DEV_JWT_SECRET: &str = "dev-secret";

impl AppConfig {
    /// Load `.env` (if present), then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let optional = |var: &str| lookup(var).ok().filter(|v| !v.trim().is_empty());
        let or_default = |var: &str, default: &str| optional(var).unwrap_or_else(|| default.to_string());

        let env = Environment::parse(&or_default("CARTLINE_ENV", "development"));

        let raw_addr = or_default("CARTLINE_BIND_ADDR", "0.0.0.0:8080");
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: "CARTLINE_BIND_ADDR".to_string(),
                reason: e.to_string(),
            })?;

        let raw_ttl = or_default("CARTLINE_INTENT_TTL_SECS", "1800");
        let intent_ttl_secs = raw_ttl
            .parse::<u64>()
            .ok()
            .filter(|ttl| *ttl > 0)
            .ok_or_else(|| ConfigError::InvalidEnvVar {
                var: "CARTLINE_INTENT_TTL_SECS".to_string(),
                reason: format!("expected a positive number of seconds, got {raw_ttl:?}"),
            })?;

        let store = StoreConfig::with_prefix(or_default("CARTLINE_TABLE_PREFIX", ""))?;

        let jwt_secret = match optional("CARTLINE_JWT_SECRET") {
            Some(secret) => secret,
            None if env == Environment::Production => {
                return Err(ConfigError::MissingEnvVar("CARTLINE_JWT_SECRET".to_string()));
            }
            None => {
                tracing::warn!("CARTLINE_JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Self {
            env,
            bind_addr,
            database_url: optional("DATABASE_URL"),
            redis_url: optional("REDIS_URL"),
            store,
            intent_ttl_secs,
            jwt_secret,
        })
    }
}
