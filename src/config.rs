use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use transloc_feed::FeedConfig;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub feed: FeedConfig,
    pub tracker: break_tracker::Config,
}

impl Config {
    /// Reads the service configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when `LISTEN_ADDR` is set but is not a socket address.
    /// Feed and tracker settings fall back to their defaults instead.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            listen_addr: listen_addr(env::var("LISTEN_ADDR").ok())?,
            feed: FeedConfig::from_env(),
            tracker: break_tracker::Config::from_env(),
        })
    }
}

fn listen_addr(value: Option<String>) -> Result<SocketAddr> {
    let value = value.unwrap_or_else(|| {
        tracing::trace!("LISTEN_ADDR not set, using default: {DEFAULT_LISTEN_ADDR}");
        DEFAULT_LISTEN_ADDR.to_string()
    });
    value.trim().parse().with_context(|| format!("parsing LISTEN_ADDR {value:?}"))
}
