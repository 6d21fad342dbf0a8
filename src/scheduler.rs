//! Fixed-interval invocation of the canary poller

use crate::errors::{CanaryError, Result};
use crate::poller::CanaryPoller;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument};

/// Runs the poller on a fixed interval until shut down
pub struct CanaryScheduler {
    poller: CanaryPoller,
    interval: Duration,
}

impl CanaryScheduler {
    pub fn new(poller: CanaryPoller, interval: Duration) -> Self {
        Self { poller, interval }
    }

    /// Run until Ctrl-C is received
    pub async fn start(&self) -> Result<usize> {
        let mut signal_result: std::io::Result<()> = Ok(());

        let invocations = self
            .run_until(async {
                signal_result = tokio::signal::ctrl_c().await;
            })
            .await;

        signal_result.map_err(|e| {
            CanaryError::Other(format!("Failed to wait for shutdown signal: {}", e))
        })?;

        Ok(invocations)
    }

    /// Start an invocation on every tick until `shutdown` resolves.
    ///
    /// The first invocation starts immediately. Each invocation runs as its own
    /// task, so a slow one may overlap the next. In-flight invocations are
    /// awaited before returning. Returns the number of invocations started.
    #[instrument(skip(self, shutdown), fields(interval_secs = self.interval.as_secs_f64()))]
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut tasks = JoinSet::new();
        let mut started = 0;
        tokio::pin!(shutdown);

        info!("Canary scheduler started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    started += 1;
                    let poller = self.poller.clone();
                    tasks.spawn(async move {
                        match poller.run_once().await {
                            Ok(summary) => debug!(
                                "Invocation reported {} with {} sites checked",
                                summary.status, summary.sites_checked
                            ),
                            Err(e) => error!("Invocation failed: {}", e),
                        }
                    });
                }
            }

            while let Some(finished) = tasks.try_join_next() {
                if let Err(e) = finished {
                    error!("Invocation task panicked: {}", e);
                }
            }
        }

        info!("Shutting down canary scheduler, waiting for {} in-flight invocations", tasks.len());

        while let Some(finished) = tasks.join_next().await {
            if let Err(e) = finished {
                error!("Invocation task panicked: {}", e);
            }
        }

        info!("Canary scheduler stopped after {} invocations", started);
        started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::probe::HttpProber;
    use crate::sink::MemoryMetricsSink;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn poller(config: &Config, sink: MemoryMetricsSink) -> CanaryPoller {
        let prober = HttpProber::new(Duration::from_millis(200)).unwrap();
        CanaryPoller::new(config, prober, Arc::new(sink)).unwrap()
    }

    #[tokio::test]
    async fn test_runs_immediately_and_on_interval() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["not a url"]"#).unwrap();

        let mut config = Config::default();
        config.targets_path = file.path().to_path_buf();

        let sink = MemoryMetricsSink::new();
        let scheduler = CanaryScheduler::new(poller(&config, sink.clone()), Duration::from_millis(50));

        let started = scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(130)))
            .await;

        assert!(started >= 2);
        assert_eq!(sink.len().await, started);
    }

    #[tokio::test]
    async fn test_failed_invocations_do_not_stop_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.targets_path = dir.path().join("missing.json");

        let sink = MemoryMetricsSink::new();
        let scheduler = CanaryScheduler::new(poller(&config, sink.clone()), Duration::from_millis(30));

        let started = scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(100)))
            .await;

        assert!(started >= 2);
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_slow_invocations_overlap_and_finish_before_shutdown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["{}/slow"]"#, server.uri()).unwrap();

        let mut config = Config::default();
        config.targets_path = file.path().to_path_buf();

        let sink = MemoryMetricsSink::new();
        let prober = HttpProber::new(Duration::from_secs(2)).unwrap();
        let poller = CanaryPoller::new(&config, prober, Arc::new(sink.clone())).unwrap();
        let scheduler = CanaryScheduler::new(poller, Duration::from_millis(50));

        let begin = std::time::Instant::now();
        let started = scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(130)))
            .await;
        let elapsed = begin.elapsed();

        // Later invocations began while the first was still waiting on its target
        assert!(started >= 2);
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(300) * started as u32);

        let batches = sink.batches().await;
        assert_eq!(batches.len(), started);
        for batch in &batches {
            assert_eq!(batch.metric_data[0].value, 1.0);
        }
    }
}
