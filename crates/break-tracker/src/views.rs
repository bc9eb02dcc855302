//! Read-only projections of vehicle state, shaped for the query API.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RouteNames;
use crate::state::{VehicleState, whole_secs};

const SHORT_WINDOW_HOURS: i64 = 2;
const LONG_WINDOW_HOURS: i64 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBreak {
    pub vehicle_id: String,
    pub name: String,
    pub route_id: Option<String>,
    pub route_name: String,
    pub lat: f64,
    pub lng: f64,
    /// Seconds into the open break.
    pub current_break: u64,
    /// Recorded break time plus the open break.
    pub total_break: u64,
}

impl ActiveBreak {
    pub(crate) fn new(vehicle_id: &str, state: &VehicleState, routes: &RouteNames) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            name: state.name.clone(),
            route_id: state.route_id.clone(),
            route_name: routes.name(state.route_id.as_deref()),
            lat: state.position.lat,
            lng: state.position.lng,
            current_break: whole_secs(state.stationary_secs),
            total_break: state.total_break_secs + whole_secs(state.stationary_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEntry {
    pub start_time: String,
    pub end_time: String,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleHistory {
    pub vehicle_id: String,
    pub name: String,
    pub route_id: Option<String>,
    pub route_name: String,
    pub breaks: Vec<BreakEntry>,
}

impl VehicleHistory {
    pub(crate) fn new(vehicle_id: &str, state: &VehicleState, routes: &RouteNames) -> Self {
        let breaks = state
            .breaks
            .iter()
            .map(|record| BreakEntry {
                start_time: iso(record.start),
                end_time: iso(record.end),
                duration: record.duration_secs,
            })
            .collect();

        Self {
            vehicle_id: vehicle_id.to_string(),
            name: state.name.clone(),
            route_id: state.route_id.clone(),
            route_name: routes.name(state.route_id.as_deref()),
            breaks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePosition {
    pub vehicle_id: String,
    pub name: String,
    pub route_id: Option<String>,
    pub route_name: String,
    pub lat: f64,
    pub lng: f64,
    pub on_break: bool,
}

impl LivePosition {
    pub(crate) fn new(vehicle_id: &str, state: &VehicleState, routes: &RouteNames) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            name: state.name.clone(),
            route_id: state.route_id.clone(),
            route_name: routes.name(state.route_id.as_deref()),
            lat: state.position.lat,
            lng: state.position.lng,
            on_break: state.on_break(),
        }
    }
}

/// Break time within the trailing 2h and 4h windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakSummary {
    pub vehicle_id: String,
    pub name: String,
    pub route_name: String,
    pub on_break: bool,
    #[serde(rename = "breakTime2h")]
    pub break_time_2h: u64,
    #[serde(rename = "breakTime4h")]
    pub break_time_4h: u64,
}

impl BreakSummary {
    pub(crate) fn new(
        vehicle_id: &str, state: &VehicleState, routes: &RouteNames, now: DateTime<Utc>,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            name: state.name.clone(),
            route_name: routes.name(state.route_id.as_deref()),
            on_break: state.on_break(),
            break_time_2h: window_total(state, now, TimeDelta::hours(SHORT_WINDOW_HOURS)),
            break_time_4h: window_total(state, now, TimeDelta::hours(LONG_WINDOW_HOURS)),
        }
    }
}

// Closed breaks count when they ended inside the window; the open break
// counts only if it started inside the window.
fn window_total(state: &VehicleState, now: DateTime<Utc>, window: TimeDelta) -> u64 {
    let closed: u64 = state
        .breaks
        .iter()
        .filter(|record| now - record.end <= window)
        .map(|record| record.duration_secs)
        .sum();

    let open = state
        .current_break_start
        .map(|start| now - start)
        .filter(|elapsed| *elapsed <= window)
        .map_or(0, |elapsed| u64::try_from(elapsed.num_seconds()).unwrap_or(0));

    closed + open
}

fn iso(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
