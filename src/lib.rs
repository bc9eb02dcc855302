//! # Breakwatch
//!
//! Polls the shuttle feed on a fixed tick, feeds each snapshot to the break
//! tracker and serves the tracker's views over HTTP.

pub mod config;
pub mod http;
pub mod poller;
pub mod provider;

pub use crate::config::Config;
pub use crate::http::{SharedTracker, router};
pub use crate::provider::Provider;
