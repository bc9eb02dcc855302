//! The tick loop: one feed poll and one tracker update per interval.

use std::sync::Arc;
use std::time::Duration;

use break_tracker::{TickSummary, Tracker};
use realtime::{Clock, HttpRequest};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};
use transloc_feed::Sampler;

/// Runs ticks every `period` until `shutdown` flips to `true` or its sender
/// is dropped.
///
/// Ticks never overlap: a slow poll delays the next tick rather than racing
/// it. A tick already under way when shutdown arrives is allowed to finish.
pub async fn run<H, C>(
    sampler: Sampler<H>, tracker: Arc<Tracker<C>>, period: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    H: HttpRequest,
    C: Clock + ?Sized,
{
    let mut ticks = time::interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let stopped = *shutdown.borrow_and_update();
        if stopped {
            break;
        }

        tokio::select! {
            _ = ticks.tick() => {
                tick(&sampler, &tracker).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("Poller stopped");
}

/// Polls the feed once and applies the snapshot.
///
/// A failed poll leaves every vehicle untouched and returns `None`.
pub async fn tick<H, C>(sampler: &Sampler<H>, tracker: &Tracker<C>) -> Option<TickSummary>
where
    H: HttpRequest,
    C: Clock + ?Sized,
{
    match sampler.poll().await {
        Ok(snapshot) => {
            let summary = tracker.update(&snapshot);
            info!(
                monotonic_counter.ticks = 1,
                observations = summary.observations,
                rejected = summary.rejected,
                new_vehicles = summary.new_vehicles,
                moved = summary.moved,
                breaks_started = summary.breaks_started,
                breaks_closed = summary.breaks_closed,
                breaks_suppressed = summary.breaks_suppressed,
                on_break = summary.on_break,
                vehicles = tracker.len(),
                "Tick applied"
            );
            Some(summary)
        }
        Err(err) => {
            error!(
                monotonic_counter.poll_errors = 1,
                code = err.code(),
                error = %err,
                "Feed poll failed; keeping previous state"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use anyhow::anyhow;
    use break_tracker::Config;
    use bytes::Bytes;
    use http::{Request, Response};
    use http_body::Body;
    use realtime::SystemClock;
    use tracing::instrument::WithSubscriber;
    use transloc_feed::FeedConfig;

    use super::*;

    const FEED: &str = include_str!("../crates/transloc-feed/data/vehicle-points.jsonp");

    #[derive(Default)]
    struct Feed {
        down: AtomicBool,
        calls: AtomicUsize,
    }

    impl HttpRequest for Feed {
        fn fetch<T>(
            &self, _request: Request<T>,
        ) -> impl Future<Output = anyhow::Result<Response<Bytes>>> + Send
        where
            T: Body + Send + 'static,
            T::Data: Send,
            T::Error: Into<Box<dyn Error + Send + Sync + 'static>>,
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let down = self.down.load(Ordering::SeqCst);
            async move {
                if down {
                    return Err(anyhow!("connection refused"));
                }
                Ok(Response::new(Bytes::from_static(FEED.as_bytes())))
            }
        }
    }

    fn setup() -> (Arc<Feed>, Sampler<Feed>, Arc<Tracker<SystemClock>>) {
        let feed = Arc::new(Feed::default());
        let sampler = Sampler::new(FeedConfig::default(), Arc::clone(&feed));
        let tracker = Arc::new(Tracker::new(Config::default(), Arc::new(SystemClock)));
        (feed, sampler, tracker)
    }

    #[tokio::test]
    async fn tick_applies_snapshot() {
        let (_feed, sampler, tracker) = setup();

        let summary = tick(&sampler, &tracker).await.expect("tick should apply");

        assert_eq!(summary.observations, 3);
        assert_eq!(summary.new_vehicles, 3);
        assert_eq!(tracker.len(), 3);
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("should lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn tick_logs_summary() {
        let (_feed, sampler, tracker) = setup();
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tick(&sampler, &tracker).with_subscriber(subscriber).await.expect("tick should apply");

        let logged = String::from_utf8(capture.0.lock().expect("should lock").clone())
            .expect("log should be UTF-8");
        assert!(logged.contains("Tick applied"));
        assert!(logged.contains("new_vehicles=3"));
        assert!(logged.contains("breaks_suppressed=0"));
    }

    #[tokio::test]
    async fn failed_poll_keeps_state() {
        let (feed, sampler, tracker) = setup();
        tick(&sampler, &tracker).await.expect("tick should apply");
        let before = tracker.vehicle("17").expect("vehicle tracked");

        feed.down.store(true, Ordering::SeqCst);
        assert!(tick(&sampler, &tracker).await.is_none());

        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.vehicle("17").expect("vehicle tracked"), before);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (feed, sampler, tracker) = setup();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run(
            sampler,
            Arc::clone(&tracker),
            Duration::from_millis(10),
            shutdown_rx,
        ));
        time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send_replace(true);

        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("poller should stop")
            .expect("poller should not panic");

        assert!(feed.calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(tracker.len(), 3);
    }
}
