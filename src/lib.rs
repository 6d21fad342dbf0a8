//! Website Canary Library
//!
//! This library probes a static list of websites and publishes availability
//! and latency metrics for each of them to a write-only metrics sink.

pub mod config;
pub mod dashboard;
pub mod errors;
pub mod poller;
pub mod probe;
pub mod sample;
pub mod scheduler;
pub mod sink;
pub mod targets;

pub use config::Config;
pub use dashboard::Dashboard;
pub use errors::{CanaryError, Result};
pub use poller::{CanaryPoller, InvocationSummary};
pub use probe::{HttpProber, ProbeFailure, ProbeOutcome};
pub use sample::{MetricBatch, MetricDatum, Sample};
pub use scheduler::CanaryScheduler;
pub use sink::{HttpMetricsSink, LogMetricsSink, MemoryMetricsSink, MetricsSink};
pub use targets::Target;
