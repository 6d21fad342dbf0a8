//! Canary poller: probe every configured target and emit its samples

use crate::config::Config;
use crate::errors::{CanaryError, Result};
use crate::probe::{HttpProber, ProbeOutcome};
use crate::sample::Sample;
use crate::sink::{HttpMetricsSink, LogMetricsSink, MetricsSink};
use crate::targets::{Target, load_targets};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

pub const STATUS_METRICS_SENT: &str = "metrics_sent";

/// Result reported by one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationSummary {
    pub status: String,
    /// Number of targets attempted, not the number that were healthy
    pub sites_checked: usize,
}

impl InvocationSummary {
    fn metrics_sent(sites_checked: usize) -> Self {
        Self {
            status: STATUS_METRICS_SENT.to_string(),
            sites_checked,
        }
    }
}

/// Sequential canary over a static target list
#[derive(Clone)]
pub struct CanaryPoller {
    targets_path: PathBuf,
    namespace: String,
    dimension_name: String,
    prober: HttpProber,
    sink: Arc<dyn MetricsSink>,
}

impl CanaryPoller {
    /// Create a poller from explicit dependencies
    pub fn new(config: &Config, prober: HttpProber, sink: Arc<dyn MetricsSink>) -> Result<Self> {
        config.validate().map_err(CanaryError::Config)?;

        Ok(Self {
            targets_path: config.targets_path.clone(),
            namespace: config.namespace.clone(),
            dimension_name: config.dimension_name.clone(),
            prober,
            sink,
        })
    }

    /// Create a poller with the prober and sink described by the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let prober = HttpProber::new(config.probe_timeout)?;

        let sink: Arc<dyn MetricsSink> = match &config.sink_url {
            Some(url) => Arc::new(HttpMetricsSink::new(url.clone(), config.sink_timeout)?),
            None => Arc::new(LogMetricsSink),
        };

        Self::new(config, prober, sink)
    }

    /// Run one invocation: load the target list, then probe and emit each target.
    ///
    /// Only a target list that cannot be loaded fails the invocation.
    #[instrument(skip(self), fields(invocation_id = %Uuid::new_v4()))]
    pub async fn run_once(&self) -> Result<InvocationSummary> {
        let targets = load_targets(&self.targets_path).await.inspect_err(|e| {
            error!("Aborting invocation before probing: {}", e);
        })?;

        Ok(self.poll_targets(&targets).await)
    }

    /// Probe and emit every target in order
    pub async fn poll_targets(&self, targets: &[Target]) -> InvocationSummary {
        let mut sites_checked = 0;
        let mut emission_failures = 0;

        for target in targets {
            let sample = self.check_target(target).await;

            if let Err(e) = self.emit(&sample).await {
                emission_failures += 1;
                error!(site = %target, "Failed to emit metrics: {}", e);
            }

            sites_checked += 1;
        }

        info!(
            "Canary invocation finished - {} sites checked, {} emission failures",
            sites_checked, emission_failures
        );

        InvocationSummary::metrics_sent(sites_checked)
    }

    /// Probe one target and derive its sample; probe failures never propagate
    pub async fn check_target(&self, target: &Target) -> Sample {
        let outcome = self.prober.probe(target).await;

        match &outcome {
            ProbeOutcome::Responded { status, elapsed } => {
                debug!(site = %target, status = status.as_u16(), elapsed_secs = elapsed.as_secs_f64(), "Target responded");
            }
            ProbeOutcome::Failed { kind, reason } => {
                warn!(site = %target, kind = %kind, "Probe failed: {}", reason);
            }
        }

        Sample::from_outcome(target.clone(), &outcome, Utc::now())
    }

    async fn emit(&self, sample: &Sample) -> Result<()> {
        let batch = sample.to_batch(&self.namespace, &self.dimension_name);
        self.sink.put_metric_data(&batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::MetricBatch;
    use crate::sink::MemoryMetricsSink;
    use async_trait::async_trait;
    use std::time::Duration;

    struct RejectingSink;

    #[async_trait]
    impl MetricsSink for RejectingSink {
        async fn put_metric_data(&self, _batch: &MetricBatch) -> Result<()> {
            Err(CanaryError::Emission("sink unavailable".to_string()))
        }
    }

    fn poller_with(config: &Config, sink: Arc<dyn MetricsSink>) -> CanaryPoller {
        let prober = HttpProber::new(Duration::from_millis(500)).unwrap();
        CanaryPoller::new(config, prober, sink).unwrap()
    }

    #[test]
    fn test_summary_shape() {
        let json = serde_json::to_value(InvocationSummary::metrics_sent(2)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "metrics_sent", "sites_checked": 2}));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = Config::default();
        config.dimension_name = String::new();

        let prober = HttpProber::new(Duration::from_secs(1)).unwrap();
        let result = CanaryPoller::new(&config, prober, Arc::new(MemoryMetricsSink::new()));
        assert!(matches!(result, Err(CanaryError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_target_list() {
        let sink = MemoryMetricsSink::new();
        let poller = poller_with(&Config::default(), Arc::new(sink.clone()));

        let summary = poller.poll_targets(&[]).await;
        assert_eq!(summary.sites_checked, 0);
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_probes_still_counted_and_emitted() {
        let sink = MemoryMetricsSink::new();
        let poller = poller_with(&Config::default(), Arc::new(sink.clone()));
        let targets = vec![Target::new("not a url"), Target::new("also not a url")];

        let summary = poller.poll_targets(&targets).await;
        assert_eq!(summary.sites_checked, 2);

        let batches = sink.batches().await;
        assert_eq!(batches.len(), 2);
        for batch in &batches {
            assert_eq!(batch.metric_data[0].value, 0.0);
            assert_eq!(batch.metric_data[1].value, 0.0);
        }
    }

    #[tokio::test]
    async fn test_emission_failures_do_not_abort() {
        let poller = poller_with(&Config::default(), Arc::new(RejectingSink));
        let targets = vec![Target::new("not a url"), Target::new("still not a url")];

        let summary = poller.poll_targets(&targets).await;
        assert_eq!(summary.status, STATUS_METRICS_SENT);
        assert_eq!(summary.sites_checked, 2);
    }

    #[tokio::test]
    async fn test_missing_target_list_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.targets_path = dir.path().join("watch_targets.json");

        let sink = MemoryMetricsSink::new();
        let poller = poller_with(&config, Arc::new(sink.clone()));

        let err = poller.run_once().await.unwrap_err();
        assert!(err.is_configuration());
        assert!(sink.is_empty().await);
    }
}
