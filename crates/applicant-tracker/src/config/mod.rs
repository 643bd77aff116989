use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::applicants::cache::{CachePolicy, InvalidationPolicy, DEFAULT_PAGE_TTL};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key }),
        _ => Ok(default),
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "0.0.0.0");
        let port = match env::var("PORT") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT" })?,
            _ => parse_var("APP_PORT", 3000)?,
        };

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let database = DatabaseConfig {
            host: var_or("DB_HOST", "localhost"),
            port: parse_var("DB_PORT", 5432)?,
            user: var_or("DB_USER", "postgres"),
            password: var_or("DB_PASSWORD", "123"),
            name: var_or("DB_NAME", "postgres"),
            max_idle_connections: parse_var("DB_MAX_IDLE_CONNS", 10)?,
            max_open_connections: parse_var("DB_MAX_OPEN_CONNS", 100)?,
            connection_max_lifetime: Duration::from_secs(parse_var(
                "DB_CONN_MAX_LIFETIME_SECS",
                3600,
            )?),
        };

        let invalidation = match env::var("CACHE_INVALIDATION") {
            Ok(raw) if !raw.trim().is_empty() => InvalidationPolicy::from_label(&raw)
                .ok_or(ConfigError::Invalid {
                    key: "CACHE_INVALIDATION",
                })?,
            _ => InvalidationPolicy::default(),
        };

        let ttl_secs = parse_var("CACHE_TTL_SECS", DEFAULT_PAGE_TTL.as_secs())?;
        let cache = CacheConfig {
            host: var_or("REDIS_HOST", "localhost"),
            port: parse_var("REDIS_PORT", 6379)?,
            password: env::var("REDIS_PASSWORD").unwrap_or_default(),
            connect_timeout: Duration::from_millis(parse_var("REDIS_CONNECT_TIMEOUT_MS", 250)?),
            policy: CachePolicy {
                ttl: Duration::from_secs(ttl_secs),
                invalidation,
            },
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            database,
            cache,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Postgres connection and pool bounds.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_idle_connections: u32,
    pub max_open_connections: u32,
    pub connection_max_lifetime: Duration,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("max_open_connections", &self.max_open_connections)
            .field("connection_max_lifetime", &self.connection_max_lifetime)
            .finish()
    }
}

/// Redis location plus the page caching policy.
#[derive(Clone)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub connect_timeout: Duration,
    pub policy: CachePolicy,
}

impl CacheConfig {
    pub fn redis_url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/0", self.host, self.port)
        } else {
            format!("redis://:{}@{}:{}/0", self.password, self.host, self.port)
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("policy", &self.policy)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str },
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key } => write!(f, "{key} has an invalid value"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
