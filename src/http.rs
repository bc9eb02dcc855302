//! Read-only query API over the tracker.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use break_tracker::{ActiveBreak, BreakSummary, LivePosition, Tracker, VehicleHistory};
use realtime::{Clock, Error, not_found};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Tracker handle shared by the tick loop and the request handlers.
pub type SharedTracker = Arc<Tracker<dyn Clock>>;

/// Builds the query router.
pub fn router(tracker: SharedTracker) -> Router {
    Router::new()
        .route("/api/breaks", get(active_breaks))
        .route("/api/break-history", get(break_history))
        .route("/api/positions", get(positions))
        .route("/api/detailed-breaks", get(detailed_breaks))
        .route("/health", get(health))
        .fallback(fallback)
        .with_state(tracker)
}

#[axum::debug_handler]
async fn active_breaks(State(tracker): State<SharedTracker>) -> Json<Vec<ActiveBreak>> {
    Json(tracker.active_breaks())
}

#[axum::debug_handler]
async fn break_history(State(tracker): State<SharedTracker>) -> Json<Vec<VehicleHistory>> {
    Json(tracker.break_history())
}

#[axum::debug_handler]
async fn positions(State(tracker): State<SharedTracker>) -> Json<Vec<LivePosition>> {
    Json(tracker.live_positions())
}

#[axum::debug_handler]
async fn detailed_breaks(State(tracker): State<SharedTracker>) -> Json<Vec<BreakSummary>> {
    Json(tracker.break_summary())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub vehicles: usize,
}

#[axum::debug_handler]
async fn health(State(tracker): State<SharedTracker>) -> Json<Health> {
    Json(Health { status: "ok".to_string(), vehicles: tracker.len() })
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError(not_found!("no route for {}", uri.path()))
}

/// Renders a domain error as a JSON body with a matching status.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Fetch(_) | Error::Decode(_) => StatusCode::BAD_GATEWAY,
            Error::Observation(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({"code": self.0.code(), "description": self.0.description()});
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use break_tracker::{Config, Observation, VehicleSnapshot};
    use pretty_assertions::assert_eq;
    use realtime::SystemClock;

    use super::*;

    fn tracker() -> SharedTracker {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Arc::new(Tracker::new(Config::default(), clock))
    }

    fn snapshot() -> VehicleSnapshot {
        VehicleSnapshot::new(vec![
            Observation::new("17", 41.50432, -81.60868, "2903", Some("9")),
            Observation::new("23", 41.51201, -81.59873, "2911", None),
        ])
    }

    #[tokio::test]
    async fn health_counts_vehicles() {
        let tracker = tracker();
        assert_eq!(health(State(Arc::clone(&tracker))).await.0.vehicles, 0);

        tracker.update(&snapshot());
        let Json(reply) = health(State(tracker)).await;

        assert_eq!(reply, Health { status: "ok".to_string(), vehicles: 2 });
    }

    #[tokio::test]
    async fn positions_are_camel_case() {
        let tracker = tracker();
        tracker.update(&snapshot());

        let Json(live) = positions(State(tracker)).await;
        let json = serde_json::to_value(&live).expect("should serialize");

        assert_eq!(
            json[0],
            json!({
                "vehicleId": "17",
                "name": "2903",
                "routeId": "9",
                "routeName": "South Loop",
                "lat": 41.50432,
                "lng": -81.60868,
                "onBreak": false,
            })
        );
        assert_eq!(json[1]["routeName"], "Route unknown");
    }

    #[tokio::test]
    async fn fresh_tracker_has_no_breaks() {
        let tracker = tracker();
        tracker.update(&snapshot());

        assert!(active_breaks(State(Arc::clone(&tracker))).await.0.is_empty());
        let Json(history) = break_history(State(Arc::clone(&tracker))).await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|vehicle| vehicle.breaks.is_empty()));

        let Json(summary) = detailed_breaks(State(tracker)).await;
        assert!(summary.iter().all(|vehicle| vehicle.break_time_2h == 0 && !vehicle.on_break));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let ApiError(err) = fallback(Uri::from_static("/api/nope")).await;
        assert_eq!(err, Error::NotFound("no route for /api/nope".to_string()));
        assert_eq!(ApiError(err).into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_status() {
        let response = ApiError(Error::BadRequest("bad window".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn feed_errors_are_bad_gateway() {
        let response = ApiError(Error::Fetch("timed out".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
