use std::collections::HashSet;

use break_tracker::{Observation, VehicleSnapshot};
use realtime::{Error, decode_error, observation_error};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::unwrap_jsonp;

/// One entry of the `GetMapVehiclePoints` relay, as loosely typed as the
/// feed itself. Only the fields the tracker consumes are kept.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MapVehiclePoint {
    #[serde(rename = "VehicleID")]
    pub vehicle_id: Option<Value>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<Value>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<Value>,
    #[serde(rename = "Name")]
    pub name: Option<Value>,
    #[serde(rename = "RouteID")]
    pub route_id: Option<Value>,
}

impl TryFrom<MapVehiclePoint> for Observation {
    type Error = Error;

    fn try_from(point: MapVehiclePoint) -> Result<Self, Self::Error> {
        let Some(vehicle_id) = identifier(point.vehicle_id.as_ref()) else {
            return Err(observation_error!("entry has no usable VehicleID: {:?}", point.vehicle_id));
        };
        let lat = coordinate(point.latitude.as_ref())
            .ok_or_else(|| observation_error!("vehicle {} has invalid Latitude", vehicle_id))?;
        let lng = coordinate(point.longitude.as_ref())
            .ok_or_else(|| observation_error!("vehicle {} has invalid Longitude", vehicle_id))?;
        let name = identifier(point.name.as_ref()).unwrap_or_default();
        let route_id = identifier(point.route_id.as_ref());

        Ok(Self::new(vehicle_id, lat, lng, name, route_id.as_deref()))
    }
}

/// Decodes a raw feed body into a snapshot.
///
/// Entries that fail validation are returned alongside the snapshot rather
/// than failing the whole body. Repeated vehicle ids keep their first entry.
///
/// # Errors
///
/// Returns [`Error::Decode`] when the body is not a JSONP-wrapped JSON array.
pub fn decode_snapshot(body: &str) -> Result<(VehicleSnapshot, Vec<Error>), Error> {
    let inner = unwrap_jsonp(body)?;
    let entries: Vec<Value> = serde_json::from_str(inner)
        .map_err(|err| decode_error!("feed payload is not a JSON array: {}", err))?;

    let mut seen = HashSet::with_capacity(entries.len());
    let mut observations = Vec::with_capacity(entries.len());
    let mut rejected = Vec::new();

    for entry in entries {
        let observation = serde_json::from_value::<MapVehiclePoint>(entry)
            .map_err(|err| observation_error!("entry is not an object: {}", err))
            .and_then(Observation::try_from);

        match observation {
            Ok(observation) if seen.contains(&observation.vehicle_id) => {
                rejected.push(observation_error!(
                    "duplicate entry for vehicle {}",
                    observation.vehicle_id
                ));
            }
            Ok(observation) => {
                seen.insert(observation.vehicle_id.clone());
                observations.push(observation);
            }
            Err(err) => rejected.push(err),
        }
    }

    Ok((VehicleSnapshot::new(observations), rejected))
}

fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

fn coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|degrees| degrees.is_finite())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn point(value: Value) -> Result<Observation, Error> {
        let point: MapVehiclePoint = serde_json::from_value(value).expect("should deserialize");
        Observation::try_from(point)
    }

    #[test]
    fn numeric_fields() {
        let observation = point(json!({
            "VehicleID": 4021,
            "Latitude": 41.5101,
            "Longitude": -81.6050,
            "Name": "4021",
            "RouteID": 9,
            "GroundSpeed": 0.0,
        }))
        .expect("valid entry");

        assert_eq!(observation, Observation::new("4021", 41.5101, -81.6050, "4021", Some("9")));
    }

    #[test]
    fn numeric_strings_accepted() {
        let observation = point(json!({
            "VehicleID": "17",
            "Latitude": "41.5",
            "Longitude": " -81.6 ",
        }))
        .expect("valid entry");

        assert_eq!(observation, Observation::new("17", 41.5, -81.6, "", None));
    }

    #[test]
    fn missing_id_rejected() {
        let err = point(json!({"Latitude": 41.5, "Longitude": -81.6})).unwrap_err();
        assert_eq!(err.code(), "invalid_observation");
    }

    #[test]
    fn non_numeric_coordinate_rejected() {
        let err = point(json!({"VehicleID": 3, "Latitude": "north", "Longitude": -81.6}))
            .unwrap_err();
        assert_eq!(err, Error::Observation("vehicle 3 has invalid Latitude".to_string()));

        assert!(point(json!({"VehicleID": 3, "Latitude": 41.5, "Longitude": null})).is_err());
    }

    #[test]
    fn object_payload_is_decode_error() {
        let err = decode_snapshot(r#"cb({"VehicleID": 1});"#).unwrap_err();
        assert_eq!(err.code(), "decode_error");
    }

    #[test]
    fn bad_entries_do_not_fail_snapshot() {
        let body = r#"cb([
            {"VehicleID": 1, "Latitude": 41.0, "Longitude": -81.0, "Name": "1", "RouteID": 9},
            "not an object",
            {"VehicleID": 2, "Latitude": null, "Longitude": -81.0},
            {"VehicleID": 1, "Latitude": 42.0, "Longitude": -82.0}
        ]);"#;

        let (snapshot, rejected) = decode_snapshot(body).expect("envelope is valid");

        assert_eq!(snapshot.observations, vec![Observation::new("1", 41.0, -81.0, "1", Some("9"))]);
        assert_eq!(rejected.len(), 3);
        assert!(rejected.iter().all(|err| !err.is_feed_error()));
    }
}
