use std::collections::HashMap;
use std::time::Duration;

use realtime::config::{env_json, env_parse, env_secs};
use serde::{Deserialize, Serialize};

use crate::snapshot::Coordinates;

const DEFAULT_ROUTE_NAMES: &[(&str, &str)] = &[
    ("1", "BlueLink"),
    ("6", "Commuter PM"),
    ("7", "Commuter AM"),
    ("9", "South Loop"),
    ("10", "Greenlink"),
    ("11", "HEC Flyer"),
    ("12", "HEC Main"),
    ("13", "Heights AM"),
    ("14", "KSL Express"),
    ("15", "MPAC Express"),
    ("17", "Nursing 2"),
    ("18", "Nursing 1"),
    ("19", "A"),
    ("20", "B"),
    ("21", "C"),
    ("22", "Retail"),
    ("24", "West Campus"),
    ("29", "Charter"),
    ("30", "Out of Service"),
    ("33", "NightLink"),
    ("34", "HEC After Hours"),
    ("38", "Woodhill"),
    ("40", "Winter"),
    ("41", "UCRC"),
    ("42", "Asiatown"),
];

/// Break detection configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Nominal tick interval. Stillness accumulates by this amount per
    /// unchanged sample.
    pub poll_interval: Duration,
    /// Stillness required before a break is declared.
    pub break_threshold: Duration,
    /// Per-axis tolerance, in degrees, under which two positions are the same.
    pub position_tolerance: f64,
    /// Maximum age of a vehicle's last sighting for it to count as visible.
    pub stale_threshold: Duration,
    pub exclusion_zones: Vec<ExclusionZone>,
    pub route_names: RouteNames,
    /// Maximum number of closed breaks kept per vehicle. `None` keeps all.
    pub history_limit: Option<usize>,
}

impl Config {
    /// Builds the configuration from the environment, falling back to the
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let poll_interval = env_secs("POLL_INTERVAL_SECS").unwrap_or(defaults.poll_interval);
        let break_threshold =
            env_secs("BREAK_THRESHOLD_SECS").unwrap_or(defaults.break_threshold);
        let position_tolerance =
            env_parse::<f64>("POSITION_TOLERANCE").unwrap_or(defaults.position_tolerance);
        let stale_threshold =
            env_secs("STALE_THRESHOLD_SECS").unwrap_or(defaults.stale_threshold);
        let exclusion_zones = env_json("EXCLUSION_ZONES").unwrap_or(defaults.exclusion_zones);
        let route_names = env_json("ROUTE_NAMES").unwrap_or(defaults.route_names);
        let history_limit = env_parse::<usize>("BREAK_HISTORY_LIMIT").or(defaults.history_limit);

        Self {
            poll_interval,
            break_threshold,
            position_tolerance,
            stale_threshold,
            exclusion_zones,
            route_names,
            history_limit,
        }
    }

    /// Whether the position lies inside any exclusion zone.
    #[must_use]
    pub fn is_excluded(&self, position: Coordinates) -> bool {
        self.exclusion_zones.iter().any(|zone| zone.contains(position))
    }

    pub(crate) fn poll_interval_secs(&self) -> f64 {
        self.poll_interval.as_secs_f64()
    }

    pub(crate) fn break_threshold_secs(&self) -> f64 {
        self.break_threshold.as_secs_f64()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            break_threshold: Duration::from_secs(180),
            position_tolerance: 0.0001,
            stale_threshold: Duration::from_secs(60),
            exclusion_zones: vec![
                ExclusionZone::new("depot", 41.5088, 41.5107, -81.619, -81.6154),
                ExclusionZone::new("fuel station", 41.5131, 41.5126, -81.6003, -81.5991),
            ],
            route_names: RouteNames::default(),
            history_limit: None,
        }
    }
}

/// A lat/lng bounding box in which stillness is operational (parking,
/// fuelling) rather than a break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ZoneBounds")]
pub struct ExclusionZone {
    pub name: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl ExclusionZone {
    /// Creates a zone from two latitude and two longitude edges, in any order.
    #[must_use]
    pub fn new(name: impl Into<String>, lat_a: f64, lat_b: f64, lng_a: f64, lng_b: f64) -> Self {
        Self {
            name: name.into(),
            min_lat: lat_a.min(lat_b),
            max_lat: lat_a.max(lat_b),
            min_lng: lng_a.min(lng_b),
            max_lng: lng_a.max(lng_b),
        }
    }

    /// Edges are inclusive.
    #[must_use]
    pub fn contains(&self, position: Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&position.lat)
            && (self.min_lng..=self.max_lng).contains(&position.lng)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneBounds {
    #[serde(default)]
    name: String,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl From<ZoneBounds> for ExclusionZone {
    fn from(bounds: ZoneBounds) -> Self {
        Self::new(bounds.name, bounds.min_lat, bounds.max_lat, bounds.min_lng, bounds.max_lng)
    }
}

/// Route id to display name lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteNames(HashMap<String, String>);

impl RouteNames {
    #[must_use]
    pub const fn new(names: HashMap<String, String>) -> Self {
        Self(names)
    }

    /// Display name for a route, `"Route {id}"` when the id is not listed.
    #[must_use]
    pub fn name(&self, route_id: Option<&str>) -> String {
        let Some(route_id) = route_id else {
            return String::from("Route unknown");
        };
        self.0.get(route_id).cloned().unwrap_or_else(|| format!("Route {route_id}"))
    }
}

impl Default for RouteNames {
    fn default() -> Self {
        Self(
            DEFAULT_ROUTE_NAMES
                .iter()
                .map(|(id, name)| ((*id).to_string(), (*name).to_string()))
                .collect(),
        )
    }
}
