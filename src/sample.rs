//! Samples derived from probes and the metric data they are emitted as

use crate::probe::ProbeOutcome;
use crate::targets::Target;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const AVAILABILITY_METRIC: &str = "Availability";
pub const LATENCY_METRIC: &str = "Latency";

/// Availability and latency of one target at one point in time
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub target: Target,
    pub availability: u8,
    pub latency_seconds: f64,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    /// Derive a sample from a probe outcome.
    ///
    /// Any completed response keeps its latency, even when the status is not
    /// 200. A failed request reports zero for both values.
    pub fn from_outcome(target: Target, outcome: &ProbeOutcome, timestamp: DateTime<Utc>) -> Self {
        let (availability, latency_seconds) = match outcome {
            ProbeOutcome::Responded { elapsed, .. } => {
                (u8::from(outcome.is_available()), round_millis(*elapsed))
            }
            ProbeOutcome::Failed { .. } => (0, 0.0),
        };

        Self {
            target,
            availability,
            latency_seconds,
            timestamp,
        }
    }

    /// Availability then latency, sharing dimension and timestamp
    pub fn to_datums(&self, dimension_name: &str) -> Vec<MetricDatum> {
        let dimensions = vec![Dimension {
            name: dimension_name.to_string(),
            value: self.target.url().to_string(),
        }];

        vec![
            MetricDatum {
                metric_name: AVAILABILITY_METRIC.to_string(),
                dimensions: dimensions.clone(),
                timestamp: self.timestamp,
                value: f64::from(self.availability),
                unit: StandardUnit::Count,
            },
            MetricDatum {
                metric_name: LATENCY_METRIC.to_string(),
                dimensions,
                timestamp: self.timestamp,
                value: self.latency_seconds,
                unit: StandardUnit::Seconds,
            },
        ]
    }

    pub fn to_batch(&self, namespace: &str, dimension_name: &str) -> MetricBatch {
        MetricBatch {
            namespace: namespace.to_string(),
            metric_data: self.to_datums(dimension_name),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum StandardUnit {
    Count,
    Seconds,
}

impl std::fmt::Display for StandardUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StandardUnit::Count => write!(f, "Count"),
            StandardUnit::Seconds => write!(f, "Seconds"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDatum {
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: StandardUnit,
}

/// Data points submitted to the sink in one call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MetricBatch {
    pub namespace: String,
    pub metric_data: Vec<MetricDatum>,
}

impl MetricBatch {
    pub fn is_empty(&self) -> bool {
        self.metric_data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metric_data.len()
    }
}

/// Fractional seconds rounded to millisecond precision
pub fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeFailure;
    use reqwest::StatusCode;

    fn responded(status: StatusCode, millis: u64) -> ProbeOutcome {
        ProbeOutcome::Responded {
            status,
            elapsed: Duration::from_micros(millis * 1000 + 400),
        }
    }

    #[test]
    fn test_round_millis() {
        assert_eq!(round_millis(Duration::from_micros(1_234_567)), 1.235);
        assert_eq!(round_millis(Duration::from_micros(1_234_400)), 1.234);
        assert_eq!(round_millis(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_sample_from_ok_response() {
        let sample = Sample::from_outcome(
            Target::new("https://example.com"),
            &responded(StatusCode::OK, 250),
            Utc::now(),
        );

        assert_eq!(sample.availability, 1);
        assert_eq!(sample.latency_seconds, 0.25);
    }

    #[test]
    fn test_non_200_keeps_latency() {
        let sample = Sample::from_outcome(
            Target::new("https://example.com"),
            &responded(StatusCode::INTERNAL_SERVER_ERROR, 1500),
            Utc::now(),
        );

        assert_eq!(sample.availability, 0);
        assert_eq!(sample.latency_seconds, 1.5);
    }

    #[test]
    fn test_failure_zeroes_both_values() {
        let outcome = ProbeOutcome::Failed {
            kind: ProbeFailure::Timeout,
            reason: "timed out".to_string(),
        };
        let sample = Sample::from_outcome(Target::new("https://example.com"), &outcome, Utc::now());

        assert_eq!(sample.availability, 0);
        assert_eq!(sample.latency_seconds, 0.0);
    }

    #[test]
    fn test_batch_wire_shape() {
        let timestamp = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let sample = Sample::from_outcome(
            Target::new("https://example.com"),
            &responded(StatusCode::OK, 42),
            timestamp,
        );

        let batch = sample.to_batch("CustomWebHealth", "Website");
        assert_eq!(batch.len(), 2);

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["Namespace"], "CustomWebHealth");
        assert_eq!(json["MetricData"][0]["MetricName"], "Availability");
        assert_eq!(json["MetricData"][0]["Unit"], "Count");
        assert_eq!(json["MetricData"][0]["Value"], 1.0);
        assert_eq!(json["MetricData"][0]["Dimensions"][0]["Name"], "Website");
        assert_eq!(json["MetricData"][0]["Dimensions"][0]["Value"], "https://example.com");
        assert_eq!(json["MetricData"][1]["MetricName"], "Latency");
        assert_eq!(json["MetricData"][1]["Unit"], "Seconds");
        assert_eq!(json["MetricData"][1]["Value"], 0.042);
        assert_eq!(
            json["MetricData"][0]["Timestamp"],
            json["MetricData"][1]["Timestamp"]
        );
    }
}
