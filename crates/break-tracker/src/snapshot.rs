use realtime::{Error, observation_error};
use serde::{Deserialize, Serialize};

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Per-axis comparison; deliberately not a distance metric.
    #[must_use]
    pub fn same_as(&self, other: Self, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() < tolerance && (self.lng - other.lng).abs() < tolerance
    }
}

/// One vehicle sighting within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub vehicle_id: String,
    pub position: Coordinates,
    pub name: String,
    pub route_id: Option<String>,
}

impl Observation {
    #[must_use]
    pub fn new(
        vehicle_id: impl Into<String>, lat: f64, lng: f64, name: impl Into<String>,
        route_id: Option<&str>,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            position: Coordinates::new(lat, lng),
            name: name.into(),
            route_id: route_id.map(ToString::to_string),
        }
    }

    /// Checks the entry is usable by the tracker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Observation`] when the vehicle id is blank or either
    /// coordinate is not a finite number.
    pub fn validate(&self) -> Result<(), Error> {
        if self.vehicle_id.trim().is_empty() {
            return Err(observation_error!("missing vehicle id"));
        }
        if !self.position.lat.is_finite() || !self.position.lng.is_finite() {
            return Err(observation_error!(
                "vehicle {} has non-numeric coordinates ({}, {})",
                self.vehicle_id,
                self.position.lat,
                self.position.lng
            ));
        }
        Ok(())
    }
}

/// The full set of observations from one poll of the feed. Unordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub observations: Vec<Observation>,
}

impl VehicleSnapshot {
    #[must_use]
    pub const fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl FromIterator<Observation> for VehicleSnapshot {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self { observations: iter.into_iter().collect() }
    }
}
