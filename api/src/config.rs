use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not defined in the environment or .env file")]
    MissingVar(&'static str),

    #[error("{name} has an invalid value {value:?}: expected {expected}")]
    InvalidVar {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    /// MongoDB connection string (required)
    pub mongo_db_url: String,
    /// Database name override; falls back to the connection string's default database
    pub mongo_db_name: Option<String>,
    /// Server selection timeout for the startup ping
    pub connect_timeout: Duration,
    pub host: IpAddr,
    pub port: u16,
    /// Upper bound on how long in-flight requests may run after a termination signal
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongo_db_url = lookup("MONGO_DB_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingVar("MONGO_DB_URL"))?;

        let mongo_db_name = lookup("MONGO_DB_NAME").filter(|name| !name.is_empty());

        let host = match lookup("HOST") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar {
                name: "HOST",
                value,
                expected: "an IP address",
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT, "a TCP port number")?;

        let connect_timeout_ms = parse_or(
            "MONGO_CONNECT_TIMEOUT_MS",
            lookup("MONGO_CONNECT_TIMEOUT_MS"),
            DEFAULT_CONNECT_TIMEOUT_MS,
            "a number of milliseconds",
        )?;

        let shutdown_timeout_secs = parse_or(
            "SHUTDOWN_TIMEOUT_SECS",
            lookup("SHUTDOWN_TIMEOUT_SECS"),
            DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            "a number of seconds",
        )?;

        Ok(Self {
            mongo_db_url,
            mongo_db_name,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            host,
            port,
            shutdown_timeout: Duration::from_secs(shutdown_timeout_secs),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match value {
        // An empty value counts as unset, like `PORT || 8000`
        Some(value) if value.is_empty() => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar {
            name,
            value,
            expected,
        }),
        None => Ok(default),
    }
}
