//! Typed, validated service settings.
//!
//! Built once from a [`ConfigPort`] before anything is opened, so a bad INI
//! file fails fast with the offending section and key.

use std::net::SocketAddr;

use crate::domain::capital::DEFAULT_CAPITAL;
use crate::domain::error::TrackerError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_POOL_SIZE: i64 = 4;
pub const DEFAULT_SESSION_LIFETIME: i64 = 86_400;
/// Hex length of a 64-byte cookie signing key.
pub const SESSION_SECRET_HEX_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: String,
    pub pool_size: u32,
    pub listen: SocketAddr,
    pub secure_cookies: bool,
    pub session_secret: Option<String>,
    pub session_lifetime: i64,
    pub session_store: Option<String>,
    pub default_capital: f64,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrackerError> {
        let database_path = config.require_string("database", "path")?;
        let pool_size = validate_pool_size(config)?;
        let listen = parse_listen(config)?;
        let session_secret = validate_session_secret(config)?;
        let session_lifetime = validate_session_lifetime(config)?;
        let default_capital = validate_default_capital(config)?;

        let session_store = config
            .get_string("auth", "session_store")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            database_path,
            pool_size,
            listen,
            secure_cookies: config.get_bool("web", "secure_cookies", false),
            session_secret,
            session_lifetime,
            session_store,
            default_capital,
        })
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TrackerError {
    TrackerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<u32, TrackerError> {
    let value = config.get_int("database", "pool_size", DEFAULT_POOL_SIZE);
    if !(1..=64).contains(&value) {
        return Err(invalid(
            "database",
            "pool_size",
            "pool_size must be between 1 and 64",
        ));
    }
    Ok(value as u32)
}

fn parse_listen(config: &dyn ConfigPort) -> Result<SocketAddr, TrackerError> {
    let raw = config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    raw.trim()
        .parse()
        .map_err(|_| invalid("web", "listen", format!("'{raw}' is not a socket address")))
}

fn validate_session_secret(config: &dyn ConfigPort) -> Result<Option<String>, TrackerError> {
    let Some(secret) = config.get_string("auth", "session_secret") else {
        return Ok(None);
    };
    let secret = secret.trim().to_string();
    if secret.len() != SESSION_SECRET_HEX_LEN || !secret.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(
            "auth",
            "session_secret",
            format!("session_secret must be {SESSION_SECRET_HEX_LEN} hex characters"),
        ));
    }
    Ok(Some(secret))
}

fn validate_session_lifetime(config: &dyn ConfigPort) -> Result<i64, TrackerError> {
    let value = config.get_int("auth", "session_lifetime", DEFAULT_SESSION_LIFETIME);
    if value <= 0 {
        return Err(invalid(
            "auth",
            "session_lifetime",
            "session_lifetime must be positive",
        ));
    }
    Ok(value)
}

fn validate_default_capital(config: &dyn ConfigPort) -> Result<f64, TrackerError> {
    let value = config.get_double("ledger", "default_capital", DEFAULT_CAPITAL);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "ledger",
            "default_capital",
            "default_capital must be a non-negative number",
        ));
    }
    Ok(value)
}
