//! # Config
//!
//! Environment lookups shared by the service crates. A variable that is set
//! but unusable is logged and treated as unset, so callers fall back to their
//! defaults instead of failing at startup.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

/// Parses `key` with [`FromStr`].
#[must_use]
pub fn env_parse<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = env::var(key).ok()?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(key, value = %value, error = %err, "Invalid configuration value; using default");
            None
        }
    }
}

/// Reads `key` as a positive number of (possibly fractional) seconds.
///
/// Values that overflow [`Duration`] or round down to zero are rejected.
#[must_use]
pub fn env_secs(key: &str) -> Option<Duration> {
    let secs = env_parse::<f64>(key)?;
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) if !duration.is_zero() => Some(duration),
        Ok(_) => {
            warn!(key, secs, "Duration must be positive; using default");
            None
        }
        Err(err) => {
            warn!(key, secs, error = %err, "Duration out of range; using default");
            None
        }
    }
}

/// Reads `key` as a JSON document.
#[must_use]
pub fn env_json<T: DeserializeOwned>(key: &str) -> Option<T> {
    let value = env::var(key).ok()?;
    match serde_json::from_str(&value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(key, error = %err, "Invalid JSON configuration value; using default");
            None
        }
    }
}
