//! Connection options.
//!
//! Options can be given explicitly, read from the environment, or both. With
//! [`ClientOptions::with_env_overrides`] a set environment variable wins over
//! the explicit value:
//!
//! | option   | variable    |
//! |----------|-------------|
//! | user     | `DB_USER`   |
//! | password | `DB_PASS`   |
//! | host     | `DB_HOST`   |
//! | port     | `DB_PORT`   |
//! | name     | `DB_NAME`   |
//! | schema   | `DB_SCHEMA` |
//! | log level | `EAZYDB_LOG_LEVEL` |

use crate::error::{OrmError, OrmResult};
use crate::log::SqlLogger;
use serde::{Deserialize, Deserializer};
use std::fmt;
use tracing::Level;

/// Options for [`Client`](crate::Client).
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Database name.
    pub name: Option<String>,
    /// Schema searched when reading existing table columns.
    pub schema: String,
    /// Whether to emit SQL log events.
    pub logging: bool,
    /// Level SQL events are emitted at; the logger default when unset.
    #[serde(deserialize_with = "deserialize_level")]
    pub log_level: Option<Level>,
    /// Maximum pooled connections.
    pub pool_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user: None,
            password: None,
            host: None,
            port: None,
            name: None,
            schema: "public".to_string(),
            logging: false,
            log_level: None,
            pool_size: 16,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("logging", &self.logging)
            .field("log_level", &self.log_level)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

impl ClientOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every option from the environment.
    pub fn from_env() -> OrmResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Replace explicit values with environment variables that are set.
    pub fn with_env_overrides(self) -> OrmResult<Self> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientOptions::with_env_overrides`], with a custom lookup.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("DB_USER") {
            self.user = Some(v);
        }
        if let Some(v) = get("DB_PASS") {
            self.password = Some(v);
        }
        if let Some(v) = get("DB_HOST") {
            self.host = Some(v);
        }
        if let Some(v) = get("DB_PORT") {
            let port = v
                .parse()
                .map_err(|_| OrmError::config(format!("DB_PORT is not a valid port: {v}")))?;
            self.port = Some(port);
        }
        if let Some(v) = get("DB_NAME") {
            self.name = Some(v);
        }
        if let Some(v) = get("DB_SCHEMA") {
            self.schema = v;
        }
        if let Some(v) = get("EAZYDB_LOG_LEVEL") {
            let level = parse_level(&v).ok_or_else(|| {
                OrmError::config(format!("EAZYDB_LOG_LEVEL is not a valid level: {v}"))
            })?;
            self.log_level = Some(level);
        }
        Ok(self)
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the database name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Enable or disable SQL log events.
    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Emit SQL events at `level`.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Report the first missing setting.
    pub fn validate(&self) -> OrmResult<()> {
        fn missing(what: &str, var: &str) -> OrmError {
            OrmError::config(format!(
                "{what} is not set, either pass as a client option or set {var}"
            ))
        }

        let blank = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);

        if blank(&self.user) {
            return Err(missing("User", "DB_USER"));
        }
        if blank(&self.password) {
            return Err(missing("Password", "DB_PASS"));
        }
        if blank(&self.host) {
            return Err(missing("Host", "DB_HOST"));
        }
        if self.port.is_none() {
            return Err(missing("Port", "DB_PORT"));
        }
        if blank(&self.name) {
            return Err(missing("Database name", "DB_NAME"));
        }
        if self.schema.is_empty() {
            return Err(missing("Schema", "DB_SCHEMA"));
        }
        if self.pool_size == 0 {
            return Err(OrmError::config("pool size must be greater than zero"));
        }
        Ok(())
    }

    /// Validate and convert into a `tokio-postgres` connection config.
    pub fn to_pg_config(&self) -> OrmResult<tokio_postgres::Config> {
        self.validate()?;

        let mut cfg = tokio_postgres::Config::new();
        if let Some(user) = &self.user {
            cfg.user(user);
        }
        if let Some(password) = &self.password {
            cfg.password(password);
        }
        if let Some(host) = &self.host {
            cfg.host(host);
        }
        if let Some(port) = self.port {
            cfg.port(port);
        }
        if let Some(name) = &self.name {
            cfg.dbname(name);
        }
        Ok(cfg)
    }

    /// The logger these options ask for.
    pub fn sql_logger(&self) -> SqlLogger {
        let logger = if self.logging {
            SqlLogger::new()
        } else {
            SqlLogger::disabled()
        };
        match self.log_level {
            Some(level) => logger.level(level),
            None => logger,
        }
    }
}

/// Parse a level name; `warning`, `fatal` and `panic` are accepted as aliases.
fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "panic" | "fatal" | "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<Option<Level>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(name) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_level(&name)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid log level: {name}")))
}
