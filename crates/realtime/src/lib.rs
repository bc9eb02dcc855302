//! # Realtime Core
//!
//! Core modules shared by the feed sampler, the break tracker and the service.

pub mod config;
mod error;
mod provider;

pub use crate::error::*;
pub use crate::provider::*;
