//! Per-vehicle stationary/break state machine.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::snapshot::{Coordinates, Observation};

/// A closed break. Never modified once appended to a vehicle's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakRecord {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_secs: u64,
}

/// Tracked state for one vehicle, created on first sighting and kept for the
/// life of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleState {
    /// Anchor of the current stillness episode. Only replaced on movement.
    pub position: Coordinates,
    /// Accumulated stillness since the last observed movement.
    pub stationary_secs: f64,
    /// Start of the open break, if any. Back-dated to when stillness began.
    pub current_break_start: Option<DateTime<Utc>>,
    /// Sum of recorded break durations, excluding the open break.
    pub total_break_secs: u64,
    pub breaks: Vec<BreakRecord>,
    pub name: String,
    pub route_id: Option<String>,
    pub last_seen: DateTime<Utc>,
}

/// What happened to a vehicle during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub moved: bool,
    pub closed: Option<BreakClose>,
    pub started: Option<DateTime<Utc>>,
}

/// How an open break ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakClose {
    /// Appended to the log and folded into the total.
    Recorded(BreakRecord),
    /// Stillness began inside an exclusion zone, so the episode was dropped.
    Suppressed { zone: String, duration_secs: u64 },
}

impl VehicleState {
    /// State for a vehicle seen for the first time. No break logic runs until
    /// a second sample arrives.
    #[must_use]
    pub fn new(observation: &Observation, now: DateTime<Utc>) -> Self {
        Self {
            position: observation.position,
            stationary_secs: 0.0,
            current_break_start: None,
            total_break_secs: 0,
            breaks: Vec::new(),
            name: observation.name.clone(),
            route_id: observation.route_id.clone(),
            last_seen: now,
        }
    }

    #[must_use]
    pub const fn on_break(&self) -> bool {
        self.current_break_start.is_some()
    }

    /// Whether the vehicle was seen within the staleness window.
    #[must_use]
    pub fn is_visible(&self, now: DateTime<Utc>, stale_threshold: TimeDelta) -> bool {
        now - self.last_seen <= stale_threshold
    }

    /// Advances the state machine with a new sample.
    pub fn observe(
        &mut self, observation: &Observation, now: DateTime<Utc>, config: &Config,
    ) -> Transition {
        let mut transition = Transition::default();

        if self.position.same_as(observation.position, config.position_tolerance) {
            self.stationary_secs += config.poll_interval_secs();
        } else {
            transition.moved = true;
            transition.closed = self.close_break(now, config);
            self.position = observation.position;
            self.stationary_secs = 0.0;
        }

        self.name.clone_from(&observation.name);
        self.route_id.clone_from(&observation.route_id);
        self.last_seen = now;

        if !self.on_break()
            && self.stationary_secs >= config.break_threshold_secs()
            && !config.is_excluded(observation.position)
        {
            let start = now - secs_delta(self.stationary_secs);
            self.current_break_start = Some(start);
            transition.started = Some(start);
        }

        transition
    }

    // Zone membership is judged at the stillness anchor, i.e. where the
    // episode began, not where the vehicle moved to.
    fn close_break(&mut self, now: DateTime<Utc>, config: &Config) -> Option<BreakClose> {
        let start = self.current_break_start.take()?;
        let duration_secs = whole_secs(self.stationary_secs);

        if let Some(zone) = config.exclusion_zones.iter().find(|zone| zone.contains(self.position))
        {
            return Some(BreakClose::Suppressed { zone: zone.name.clone(), duration_secs });
        }

        let record = BreakRecord { start, end: now, duration_secs };
        self.total_break_secs += duration_secs;
        self.breaks.push(record.clone());

        if let Some(limit) = config.history_limit
            && self.breaks.len() > limit
        {
            let excess = self.breaks.len() - limit;
            self.breaks.drain(..excess);
        }

        Some(BreakClose::Recorded(record))
    }

    /// Elapsed time of the open break, floored to whole seconds.
    #[must_use]
    pub fn current_break_secs(&self) -> u64 {
        if self.on_break() { whole_secs(self.stationary_secs) } else { 0 }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn whole_secs(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 { secs.floor() as u64 } else { 0 }
}

#[allow(clippy::cast_possible_truncation)]
fn secs_delta(secs: f64) -> TimeDelta {
    TimeDelta::milliseconds((secs * 1000.0).round() as i64)
}
