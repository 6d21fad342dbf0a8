//! Write-only metrics sinks

use crate::errors::{CanaryError, Result};
use crate::sample::MetricBatch;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Destination for metric data points
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn put_metric_data(&self, batch: &MetricBatch) -> Result<()>;
}

/// Sink posting batches as JSON to a metrics endpoint
#[derive(Debug, Clone)]
pub struct HttpMetricsSink {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpMetricsSink {
    pub fn new(endpoint: String, http_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("site_canary/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CanaryError::Http)?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout: http_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Handle the HTTP response from the metrics endpoint
    async fn handle_response(&self, response: Response, namespace: &str) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            debug!("Metric data for {} accepted by sink", namespace);
            return Ok(());
        }

        let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        let error_message = match status.as_u16() {
            400 => format!("Bad request for namespace {}: {}", namespace, error_body),
            401 => format!("Unauthorized for namespace {}: {}", namespace, error_body),
            403 => format!("Forbidden for namespace {}: {}", namespace, error_body),
            404 => format!("Metrics endpoint not found: {}", error_body),
            413 => format!("Metric batch too large: {}", error_body),
            429 => format!("Rate limited by metrics sink: {}", error_body),
            500..=599 => format!("Metrics sink server error: {}", error_body),
            _ => format!("Unexpected response {} from metrics sink: {}", status, error_body),
        };

        Err(CanaryError::Emission(error_message))
    }
}

#[async_trait]
impl MetricsSink for HttpMetricsSink {
    async fn put_metric_data(&self, batch: &MetricBatch) -> Result<()> {
        let url = format!("{}/v1/metrics", self.endpoint);

        debug!(
            "Sending {} data points under {} to {}",
            batch.len(),
            batch.namespace,
            url
        );

        let response = self
            .client
            .post(&url)
            .json(batch)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CanaryError::Emission(format!("Request timeout after {:?}", self.timeout))
                } else {
                    CanaryError::Http(e)
                }
            })?;

        self.handle_response(response, &batch.namespace).await
    }
}

/// Sink writing each data point as a structured log event
#[derive(Debug, Clone, Default)]
pub struct LogMetricsSink;

#[async_trait]
impl MetricsSink for LogMetricsSink {
    async fn put_metric_data(&self, batch: &MetricBatch) -> Result<()> {
        for datum in &batch.metric_data {
            let dimensions = datum
                .dimensions
                .iter()
                .map(|d| format!("{}={}", d.name, d.value))
                .collect::<Vec<_>>()
                .join(",");

            info!(
                namespace = %batch.namespace,
                metric = %datum.metric_name,
                dimensions = %dimensions,
                value = datum.value,
                unit = %datum.unit,
                timestamp = %datum.timestamp.to_rfc3339(),
                "metric"
            );
        }
        Ok(())
    }
}

/// Sink keeping every batch in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryMetricsSink {
    batches: Arc<RwLock<Vec<MetricBatch>>>,
}

impl MemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn batches(&self) -> Vec<MetricBatch> {
        self.batches.read().await.clone()
    }

    /// Take every recorded batch, leaving the sink empty
    pub async fn drain(&self) -> Vec<MetricBatch> {
        std::mem::take(&mut *self.batches.write().await)
    }

    pub async fn len(&self) -> usize {
        self.batches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.batches.read().await.is_empty()
    }
}

#[async_trait]
impl MetricsSink for MemoryMetricsSink {
    async fn put_metric_data(&self, batch: &MetricBatch) -> Result<()> {
        self.batches.write().await.push(batch.clone());
        Ok(())
    }
}
