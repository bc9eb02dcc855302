use std::env;
use std::sync::Arc;
use std::time::Duration;

use break_tracker::VehicleSnapshot;
use bytes::Bytes;
use http::Method;
use http::header::{ACCEPT, REFERER};
use http_body_util::Empty;
use realtime::config::env_secs;
use realtime::{Error, HttpRequest, Result, decode_error, fetch_error};
use tracing::{debug, warn};

use crate::types::decode_snapshot;

const DEFAULT_FEED_URL: &str = "https://cwruuh.transloc.com/Services/JSONPRelay.svc/GetMapVehiclePoints?method=jQuery1111026019195338200984_1742691992392&ApiKey=8882812681&isPublicMap=true&_=1742691993260";
const DEFAULT_REFERER: &str = "https://cwruuh.transloc.com/iframe.aspx?showTwitter=false&showRouteMenu=false&showMainMenu=false";
const ACCEPT_SCRIPT: &str = "text/javascript, application/javascript, application/ecmascript, application/x-ecmascript, */*; q=0.01";

/// Where and how to poll the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub url: String,
    pub referer: String,
    /// Upper bound on a single fetch, so an unavailable feed cannot stall
    /// later ticks.
    pub timeout: Duration,
}

impl FeedConfig {
    /// Reads `FEED_URL` and `FEED_TIMEOUT_SECS`, keeping the defaults for
    /// anything unset or unusable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let url = env::var("FEED_URL").unwrap_or_else(|_| {
            tracing::trace!("FEED_URL not set, using default: {}", defaults.url);
            defaults.url.clone()
        });
        let timeout = env_secs("FEED_TIMEOUT_SECS").unwrap_or(defaults.timeout);

        Self { url, timeout, ..defaults }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fetches one snapshot of vehicle positions per call.
pub struct Sampler<H>
where
    H: HttpRequest,
{
    config: FeedConfig,
    http: Arc<H>,
}

impl<H> Sampler<H>
where
    H: HttpRequest,
{
    #[must_use]
    pub const fn new(config: FeedConfig, http: Arc<H>) -> Self {
        Self { config, http }
    }

    #[must_use]
    pub const fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Polls the feed once.
    ///
    /// A snapshot is only returned whole: malformed entries are dropped and
    /// logged, anything wrong with the response itself fails the poll.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] on transport failure, timeout or a non-success
    /// status, and [`Error::Decode`] when the body is not a JSONP-wrapped
    /// array.
    pub async fn poll(&self) -> Result<VehicleSnapshot> {
        let request = http::Request::builder()
            .method(Method::GET)
            .uri(&self.config.url)
            .header(ACCEPT, ACCEPT_SCRIPT)
            .header("x-requested-with", "XMLHttpRequest")
            .header(REFERER, &self.config.referer)
            .body(Empty::<Bytes>::new())
            .map_err(|err| Error::Internal(format!("building feed request: {err}")))?;

        let response = tokio::time::timeout(self.config.timeout, self.http.fetch(request))
            .await
            .map_err(|elapsed| {
                fetch_error!("feed request timed out after {:?}: {}", self.config.timeout, elapsed)
            })?
            .map_err(|err| fetch_error!("feed request failed: {:#}", err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error!("feed responded with status {}", status));
        }

        let body = std::str::from_utf8(response.body())
            .map_err(|err| decode_error!("feed body is not UTF-8: {}", err))?;
        let (snapshot, rejected) = decode_snapshot(body)?;

        for err in &rejected {
            warn!(monotonic_counter.rejected_observations = 1, error = %err, "Dropping feed entry");
        }
        debug!(observations = snapshot.len(), rejected = rejected.len(), "Decoded feed snapshot");

        Ok(snapshot)
    }
}
