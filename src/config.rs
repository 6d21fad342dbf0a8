//! Configuration management for the site canary

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// File name of the target list shipped alongside the executable
pub const TARGETS_FILE_NAME: &str = "watch_targets.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the JSON list of target URLs
    pub targets_path: PathBuf,

    /// Namespace all metric data is scoped under
    pub namespace: String,

    /// Dimension key carrying the target URL
    pub dimension_name: String,

    /// Request timeout for a single probe
    pub probe_timeout: Duration,

    /// Interval between scheduled invocations
    pub schedule_interval: Duration,

    /// Endpoint of the HTTP metrics sink; metrics are logged when unset
    pub sink_url: Option<String>,

    /// HTTP timeout for metrics sink requests
    pub sink_timeout: Duration,

    /// Name of the provisioned dashboard
    pub dashboard_name: String,

    /// Aggregation period of dashboard widgets
    pub dashboard_period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets_path: default_targets_path(),
            namespace: "CustomWebHealth".to_string(),
            dimension_name: "Website".to_string(),
            probe_timeout: Duration::from_secs(5),
            schedule_interval: Duration::from_secs(300),
            sink_url: None,
            sink_timeout: Duration::from_secs(10),
            dashboard_name: "WebHealthDashboard".to_string(),
            dashboard_period: Duration::from_secs(300),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup("CANARY_TARGETS_PATH") {
            config.targets_path = PathBuf::from(path);
        }

        if let Some(namespace) = lookup("CANARY_NAMESPACE") {
            config.namespace = namespace;
        }

        if let Some(dimension_name) = lookup("CANARY_DIMENSION_NAME") {
            config.dimension_name = dimension_name;
        }

        if let Some(timeout) = lookup("PROBE_TIMEOUT_SECONDS").and_then(|v| parse_seconds(&v)) {
            config.probe_timeout = timeout;
        }

        if let Some(interval) = lookup("SCHEDULE_INTERVAL_SECONDS").and_then(|v| parse_seconds(&v)) {
            config.schedule_interval = interval;
        }

        if let Some(sink_url) = lookup("METRICS_SINK_URL") {
            let sink_url = sink_url.trim().trim_end_matches('/').to_string();
            config.sink_url = if sink_url.is_empty() { None } else { Some(sink_url) };
        }

        if let Some(timeout) = lookup("METRICS_SINK_TIMEOUT_SECONDS").and_then(|v| parse_seconds(&v)) {
            config.sink_timeout = timeout;
        }

        if let Some(dashboard_name) = lookup("DASHBOARD_NAME") {
            config.dashboard_name = dashboard_name;
        }

        if let Some(period) = lookup("DASHBOARD_PERIOD_SECONDS").and_then(|v| parse_seconds(&v)) {
            config.dashboard_period = period;
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.is_empty() {
            return Err("namespace cannot be empty".to_string());
        }

        if self.dimension_name.is_empty() {
            return Err("dimension_name cannot be empty".to_string());
        }

        if self.probe_timeout.is_zero() {
            return Err("probe_timeout must be greater than 0".to_string());
        }

        if self.schedule_interval.is_zero() {
            return Err("schedule_interval must be greater than 0".to_string());
        }

        if self.sink_timeout.is_zero() {
            return Err("sink_timeout must be greater than 0".to_string());
        }

        if let Some(url) = &self.sink_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("sink_url must be an http(s) URL, got {}", url));
            }
        }

        if self.dashboard_period.as_secs() == 0 {
            return Err("dashboard_period must be at least one second".to_string());
        }

        Ok(())
    }
}

/// Target list next to the executable if present, otherwise relative to the working directory
fn default_targets_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(TARGETS_FILE_NAME)))
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(TARGETS_FILE_NAME))
}

fn parse_seconds(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}
