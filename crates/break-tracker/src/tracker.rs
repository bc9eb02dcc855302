use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use chrono::{DateTime, TimeDelta, Utc};
use realtime::Clock;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::snapshot::VehicleSnapshot;
use crate::state::{BreakClose, VehicleState};
use crate::views::{ActiveBreak, BreakSummary, LivePosition, VehicleHistory};

/// Counters describing one applied snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSummary {
    pub observations: usize,
    pub rejected: usize,
    pub new_vehicles: usize,
    pub moved: usize,
    pub breaks_started: usize,
    pub breaks_closed: usize,
    pub breaks_suppressed: usize,
    pub on_break: usize,
}

/// Owns every vehicle's break state.
///
/// A snapshot is applied under one write guard, so readers see either the
/// state before a tick or after it, never a partly updated vehicle.
pub struct Tracker<C>
where
    C: Clock + ?Sized,
{
    config: Config,
    clock: Arc<C>,
    vehicles: RwLock<BTreeMap<String, VehicleState>>,
}

impl<C> Tracker<C>
where
    C: Clock + ?Sized,
{
    #[must_use]
    pub fn new(config: Config, clock: Arc<C>) -> Self {
        Self { config, clock, vehicles: RwLock::new(BTreeMap::new()) }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Applies one snapshot, timestamped with the clock's current time.
    pub fn update(&self, snapshot: &VehicleSnapshot) -> TickSummary {
        let now = self.clock.now();
        let mut summary = TickSummary { observations: snapshot.len(), ..TickSummary::default() };
        let mut seen = HashSet::with_capacity(snapshot.len());

        let mut vehicles = self.vehicles.write().unwrap_or_else(PoisonError::into_inner);

        for observation in &snapshot.observations {
            if let Err(err) = observation.validate() {
                warn!(monotonic_counter.rejected_observations = 1, error = %err, "Skipping observation");
                summary.rejected += 1;
                continue;
            }
            if !seen.insert(observation.vehicle_id.as_str()) {
                warn!(
                    monotonic_counter.rejected_observations = 1,
                    vehicle_id = %observation.vehicle_id,
                    "Duplicate vehicle in snapshot"
                );
                summary.rejected += 1;
                continue;
            }

            let state = match vehicles.entry(observation.vehicle_id.clone()) {
                Entry::Vacant(slot) => {
                    debug!(vehicle_id = %observation.vehicle_id, "First sighting");
                    slot.insert(VehicleState::new(observation, now));
                    summary.new_vehicles += 1;
                    continue;
                }
                Entry::Occupied(slot) => slot.into_mut(),
            };

            let transition = state.observe(observation, now, &self.config);
            if transition.moved {
                summary.moved += 1;
            }

            match transition.closed {
                Some(BreakClose::Recorded(record)) => {
                    summary.breaks_closed += 1;
                    debug!(
                        vehicle_id = %observation.vehicle_id,
                        start = %record.start,
                        duration_secs = record.duration_secs,
                        "Break ended"
                    );
                }
                Some(BreakClose::Suppressed { zone, duration_secs }) => {
                    summary.breaks_suppressed += 1;
                    debug!(
                        vehicle_id = %observation.vehicle_id,
                        zone = %zone,
                        duration_secs,
                        "Break discarded inside exclusion zone"
                    );
                }
                None => {}
            }

            if let Some(start) = transition.started {
                summary.breaks_started += 1;
                debug!(vehicle_id = %observation.vehicle_id, start = %start, "Break started");
            }
        }

        summary.on_break = vehicles.values().filter(|state| state.on_break()).count();
        summary
    }

    /// Copy of one vehicle's state.
    #[must_use]
    pub fn vehicle(&self, vehicle_id: &str) -> Option<VehicleState> {
        self.read().get(vehicle_id).cloned()
    }

    /// Number of vehicles ever seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Vehicles currently on break and seen within the staleness window.
    #[must_use]
    pub fn active_breaks(&self) -> Vec<ActiveBreak> {
        let now = self.clock.now();
        let stale = self.stale_threshold();
        self.read()
            .iter()
            .filter(|(_, state)| state.on_break() && state.is_visible(now, stale))
            .map(|(id, state)| ActiveBreak::new(id, state, &self.config.route_names))
            .collect()
    }

    /// Closed breaks for every vehicle ever seen.
    #[must_use]
    pub fn break_history(&self) -> Vec<VehicleHistory> {
        self.read()
            .iter()
            .map(|(id, state)| VehicleHistory::new(id, state, &self.config.route_names))
            .collect()
    }

    /// Vehicles seen within the staleness window.
    #[must_use]
    pub fn live_positions(&self) -> Vec<LivePosition> {
        let now = self.clock.now();
        let stale = self.stale_threshold();
        self.read()
            .iter()
            .filter(|(_, state)| state.is_visible(now, stale))
            .map(|(id, state)| LivePosition::new(id, state, &self.config.route_names))
            .collect()
    }

    /// Break time over the last 2 and 4 hours for every vehicle ever seen.
    #[must_use]
    pub fn break_summary(&self) -> Vec<BreakSummary> {
        let now = self.clock.now();
        self.read()
            .iter()
            .map(|(id, state)| BreakSummary::new(id, state, &self.config.route_names, now))
            .collect()
    }

    /// Current time according to the tracker's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn stale_threshold(&self) -> TimeDelta {
        TimeDelta::from_std(self.config.stale_threshold).unwrap_or(TimeDelta::MAX)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, VehicleState>> {
        self.vehicles.read().unwrap_or_else(PoisonError::into_inner)
    }
}
