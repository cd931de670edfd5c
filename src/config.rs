use std::env;
use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Token lifetime in seconds; the session cookie expires with it.
    pub token_ttl_secs: i64,
    pub cookie_secure: bool,
}

impl Config {
    pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

    pub fn new_from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = var("DATABASE_URL").unwrap_or_else(|| "sqlite://absensi.db?mode=rwc".to_string());

        let bind_addr = parse_var(&var, "BIND_ADDR", "127.0.0.1:3000".parse().ok())?;

        let jwt_secret = var("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < 32 {
            tracing::warn!("JWT_SECRET is shorter than recommended (32 bytes)");
        }

        let token_ttl_secs = parse_var(&var, "TOKEN_TTL_SECS", Some(Self::DEFAULT_TOKEN_TTL_SECS))?;
        if token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: "TOKEN_TTL_SECS",
                value: token_ttl_secs.to_string(),
            });
        }

        let cookie_secure = parse_var(&var, "COOKIE_SECURE", Some(false))?;

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            token_ttl_secs,
            cookie_secure,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    var: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Option<T>,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}
