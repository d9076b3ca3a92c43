use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use tracing::debug;

use crate::error::{SegmentError, SegmentResult};

/// Root configuration. Loaded from environment variables with the prefix
/// `SEGMENTS__` and an optional TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// Schema placed on the connection's `search_path`; the server default when unset.
    #[serde(default)]
    pub schema: Option<String>,
}

// Default functions
fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    5432
}
fn default_username() -> String {
    "postgres".to_string()
}
fn default_database() -> String {
    "segments".to_string()
}
fn default_ssl_mode() -> String {
    "disable".to_string()
}
fn default_max_connections() -> u32 {
    10
}
fn default_acquire_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: String::new(),
            database: default_database(),
            ssl_mode: default_ssl_mode(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            schema: None,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .field("schema", &self.schema)
            .finish()
    }
}

impl DatabaseConfig {
    /// Build driver connection options from the configured fields.
    ///
    /// Host, port, username, database and SSL mode always come from this
    /// config. An empty `password` leaves the driver's fallback in place,
    /// which is the `PGPASSWORD` environment variable when it is set.
    /// `~/.pgpass` is never read.
    pub fn connect_options(&self) -> SegmentResult<PgConnectOptions> {
        let ssl_mode = PgSslMode::from_str(&self.ssl_mode)
            .map_err(|e| SegmentError::Config(format!("invalid ssl_mode '{}': {e}", self.ssl_mode)))?;

        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.database)
            .ssl_mode(ssl_mode);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if let Some(schema) = self.schema.as_deref().filter(|s| !s.is_empty()) {
            options = options.options([("search_path", schema)]);
        }
        Ok(options)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> SegmentResult<Self> {
        Self::build(config::Config::builder(), environment())
    }

    /// Load configuration from a TOML file, with environment variables
    /// taking precedence. A missing file is not an error.
    pub fn load_from(path: &str) -> SegmentResult<Self> {
        debug!(path = path, "Loading configuration file");
        Self::build(
            config::Config::builder()
                .add_source(config::File::with_name(path).required(false)),
            environment(),
        )
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: config::Environment,
    ) -> SegmentResult<Self> {
        let config = builder
            .add_source(environment)
            .build()
            .map_err(|e| SegmentError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| SegmentError::Config(e.to_string()))
    }
}

/// `SEGMENTS__*` variables. Values stay strings until serde types them, so
/// credentials such as `0123` are not reparsed as numbers.
fn environment() -> config::Environment {
    config::Environment::with_prefix("SEGMENTS").separator("__")
}
