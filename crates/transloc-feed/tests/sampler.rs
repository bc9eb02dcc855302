
use std::sync::Arc;
use std::time::Duration;

use break_tracker::Observation;
use http::StatusCode;
use pretty_assertions::assert_eq;
use transloc_feed::{FeedConfig, Sampler};

use self::provider::{MockProvider, Reply};

fn sampler(provider: MockProvider) -> Sampler<MockProvider> {
    let config = FeedConfig {
        url: "https://feed.test/GetMapVehiclePoints?method=cb".to_string(),
        timeout: Duration::from_millis(200),
        ..FeedConfig::default()
    };
    Sampler::new(config, Arc::new(provider))
}

#[tokio::test]
async fn polls_snapshot() {
    let provider = MockProvider::ok(include_str!("../data/vehicle-points.jsonp"));
    let sampler = sampler(provider.clone());

    let snapshot = sampler.poll().await.expect("should poll");

    assert_eq!(
        snapshot.observations,
        vec![
            Observation::new("17", 41.50432, -81.60868, "2903", Some("9")),
            Observation::new("23", 41.51201, -81.59873, "2911", Some("1")),
            Observation::new("31", 41.50951, -81.61702, "2920", Some("30")),
        ]
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let (uri, headers) = &requests[0];
    assert_eq!(uri.host(), Some("feed.test"));
    assert_eq!(headers.get("x-requested-with").map(|v| v.as_bytes()), Some(&b"XMLHttpRequest"[..]));
    assert!(headers.contains_key(http::header::REFERER));
}

#[tokio::test]
async fn drops_malformed_entries() {
    let provider = MockProvider::ok(include_str!("../data/vehicle-points-mixed.jsonp"));

    let snapshot = sampler(provider).poll().await.expect("should poll");

    assert_eq!(
        snapshot.observations,
        vec![Observation::new("17", 41.50432, -81.60868, "2903", Some("9"))]
    );
}

#[tokio::test]
async fn transport_failure_is_fetch_error() {
    let provider = MockProvider::new(Reply::Fail("connection reset by peer".to_string()));

    let err = sampler(provider).poll().await.unwrap_err();

    assert_eq!(err.code(), "fetch_error");
    assert!(err.to_string().contains("connection reset by peer"));
}

#[tokio::test]
async fn error_status_is_fetch_error() {
    let provider = MockProvider::new(Reply::Body(
        StatusCode::SERVICE_UNAVAILABLE,
        "<html>Service Unavailable</html>".to_string(),
    ));

    let err = sampler(provider).poll().await.unwrap_err();

    assert_eq!(err.code(), "fetch_error");
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn slow_feed_times_out() {
    let provider = MockProvider::ok(include_str!("../data/vehicle-points.jsonp"))
        .with_delay(Duration::from_secs(5));

    let err = sampler(provider).poll().await.unwrap_err();

    assert_eq!(err.code(), "fetch_error");
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn unwrapped_body_is_decode_error() {
    let provider = MockProvider::ok(r#"[{"VehicleID": 17, "Latitude": 41.5, "Longitude": -81.6}]"#);

    let err = sampler(provider).poll().await.unwrap_err();

    assert_eq!(err.code(), "decode_error");
}

#[tokio::test]
async fn truncated_body_is_decode_error() {
    let provider = MockProvider::ok(r#"cb([{"VehicleID": 17, "Latitude": 41.5);"#);

    let err = sampler(provider).poll().await.unwrap_err();

    assert!(err.is_feed_error());
    assert_eq!(err.code(), "decode_error");
}
