//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Attendance poll configuration.
    #[serde(default)]
    pub attendance: AttendanceConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Attendance poll configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceConfig {
    /// Number of decimal digits in an attendance code.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Fraction of the code keyspace that may be in use before issuance
    /// fails instead of drawing further.
    #[serde(default = "default_keyspace_fill_limit")]
    pub keyspace_fill_limit: f64,
    /// Poll duration applied when the issuer does not supply one.
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: i64,
    /// Upper bound on poll duration.
    #[serde(default = "default_max_duration_minutes")]
    pub max_duration_minutes: i64,
    /// How long after expiry a code stays excluded from reissue. `None`
    /// falls back to `max_duration_minutes`.
    #[serde(default)]
    pub reuse_cooldown_minutes: Option<i64>,
    /// Tolerance past `expires_at` during which redemption is still
    /// accepted. Zero means the expiry boundary is exact.
    #[serde(default)]
    pub grace_seconds: i64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            keyspace_fill_limit: default_keyspace_fill_limit(),
            default_duration_minutes: default_duration_minutes(),
            max_duration_minutes: default_max_duration_minutes(),
            reuse_cooldown_minutes: None,
            grace_seconds: 0,
        }
    }
}

impl AttendanceConfig {
    /// Effective cool-down before an expired code may be reissued.
    #[must_use]
    pub fn reuse_cooldown_minutes(&self) -> i64 {
        self.reuse_cooldown_minutes
            .unwrap_or(self.max_duration_minutes)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_code_length() -> usize {
    8
}

const fn default_keyspace_fill_limit() -> f64 {
    0.5
}

const fn default_duration_minutes() -> i64 {
    10
}

const fn default_max_duration_minutes() -> i64 {
    180
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `ROLLCALL_ENV`)
    /// 3. Environment variables with `ROLLCALL_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("ROLLCALL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ROLLCALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("ROLLCALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
