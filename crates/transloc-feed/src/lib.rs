//! # TransLoc Feed
//!
//! Polls the TransLoc vehicle points relay and turns each response into a
//! validated [`VehicleSnapshot`](break_tracker::VehicleSnapshot).

mod envelope;
mod sampler;
mod types;

pub use self::envelope::unwrap_jsonp;
pub use self::sampler::{FeedConfig, Sampler};
pub use self::types::{MapVehiclePoint, decode_snapshot};
