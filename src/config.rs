//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). There is no built-in database
//! credential: the PostgreSQL backend refuses to start without
//! `DATABASE_URL`.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::service::DisconnectPolicy;

/// Error raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value {value:?} for {key}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Offending raw value.
        value: String,
    },
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Minimum idle connections.
    pub min_connections: u32,
    /// Timeout in seconds for acquiring a connection.
    pub connect_timeout_secs: u64,
}

/// Which session store backend to run.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// In-process store; sessions are lost on restart.
    Memory,
    /// PostgreSQL store.
    Postgres(DatabaseConfig),
}

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`PresenceConfig::from_env`].
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// Session store backend.
    pub store: StoreBackend,

    /// Whether closed sessions are appended to the history log.
    pub history_enabled: bool,

    /// Capacity of the relay broadcast channel.
    pub relay_capacity: usize,

    /// `client_type` values that mark an endpoint as an inspector window.
    pub inspector_client_types: Vec<String>,

    /// What an inspector's disconnect does to the session it inspects.
    pub disconnect_policy: DisconnectPolicy,

    /// Outbound event name used for error reports.
    pub error_event_name: String,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl PresenceConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a variable is malformed or
    /// `DATABASE_URL` is missing for the PostgreSQL backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`PresenceConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => parse_value("LISTEN_ADDR", &raw)?,
            None => {
                let port: u16 = parse_var(&lookup, "PORT", 8080)?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let store = match lookup("SESSION_STORE").as_deref().map(str::to_ascii_lowercase) {
            None => postgres_backend(&lookup)?,
            Some(kind) if kind == "postgres" => postgres_backend(&lookup)?,
            Some(kind) if kind == "memory" => StoreBackend::Memory,
            Some(kind) => {
                return Err(ConfigError::Invalid {
                    key: "SESSION_STORE",
                    value: kind,
                });
            }
        };

        let history_enabled = parse_bool(&lookup, "HISTORY_ENABLED", true)?;
        let relay_capacity = parse_var(&lookup, "RELAY_CAPACITY", 10_000)?;

        let inspector_client_types = lookup("INSPECTOR_CLIENT_TYPES")
            .unwrap_or_else(|| "ida,inspector".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let disconnect_policy = parse_var(&lookup, "DISCONNECT_POLICY", DisconnectPolicy::Delete)?;
        let error_event_name =
            lookup("ERROR_EVENT_NAME").unwrap_or_else(|| "error-listenner".to_string());
        let log_format = parse_var(&lookup, "LOG_FORMAT", LogFormat::Text)?;

        Ok(Self {
            listen_addr,
            store,
            history_enabled,
            relay_capacity,
            inspector_client_types,
            disconnect_policy,
            error_event_name,
            log_format,
        })
    }
}

fn postgres_backend<F>(lookup: &F) -> Result<StoreBackend, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
    Ok(StoreBackend::Postgres(DatabaseConfig {
        url,
        max_connections: parse_var(lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
        min_connections: parse_var(lookup, "DATABASE_MIN_CONNECTIONS", 2)?,
        connect_timeout_secs: parse_var(lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 5)?,
    }))
}

/// Parses a variable as `T`, returning `default` when unset.
fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

/// Parses a boolean variable. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive).
fn parse_bool<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}
