//! # Break Tracker
//!
//! Classifies periodically sampled vehicle positions into motion and
//! stationary episodes and keeps, per vehicle, the current break, a lifetime
//! total and a log of closed breaks.

pub mod config;
pub mod snapshot;
pub mod state;
pub mod tracker;
pub mod views;

pub use self::config::{Config, ExclusionZone, RouteNames};
pub use self::snapshot::{Coordinates, Observation, VehicleSnapshot};
pub use self::state::{BreakClose, BreakRecord, Transition, VehicleState};
pub use self::tracker::{TickSummary, Tracker};
pub use self::views::{ActiveBreak, BreakEntry, BreakSummary, LivePosition, VehicleHistory};
