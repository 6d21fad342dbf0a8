//! Dashboard definition derived from the polled target list

use crate::config::Config;
use crate::errors::Result;
use crate::sample::{AVAILABILITY_METRIC, LATENCY_METRIC};
use crate::targets::{Target, load_targets};
use serde::{Deserialize, Serialize};

const WIDGET_WIDTH: u32 = 12;
const WIDGET_HEIGHT: u32 = 6;

/// Dashboard with one availability and one latency graph per target
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    #[serde(skip)]
    pub name: String,
    pub widgets: Vec<Widget>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Widget {
    #[serde(rename = "type")]
    pub widget_type: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub properties: WidgetProperties,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WidgetProperties {
    pub title: String,
    /// Each entry is `[namespace, metric name, dimension name, dimension value]`
    pub metrics: Vec<Vec<String>>,
    pub view: String,
    pub stat: String,
    pub period: u64,
}

impl Dashboard {
    /// Build the dashboard for the target list the poller would load
    pub async fn load(config: &Config) -> Result<Self> {
        let targets = load_targets(&config.targets_path).await?;
        Ok(Self::for_targets(config, &targets))
    }

    pub fn for_targets(config: &Config, targets: &[Target]) -> Self {
        let widgets = targets
            .iter()
            .enumerate()
            .flat_map(|(row, target)| {
                let y = row as u32 * WIDGET_HEIGHT;
                [
                    graph_widget(config, target, AVAILABILITY_METRIC, 0, y),
                    graph_widget(config, target, LATENCY_METRIC, WIDGET_WIDTH, y),
                ]
            })
            .collect();

        Self {
            name: config.dashboard_name.clone(),
            widgets,
        }
    }

    /// Dashboard body as submitted to the dashboard backend
    pub fn body_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn graph_widget(config: &Config, target: &Target, metric: &str, x: u32, y: u32) -> Widget {
    Widget {
        widget_type: "metric".to_string(),
        x,
        y,
        width: WIDGET_WIDTH,
        height: WIDGET_HEIGHT,
        properties: WidgetProperties {
            title: format!("{} {}", target, metric),
            metrics: vec![vec![
                config.namespace.clone(),
                metric.to_string(),
                config.dimension_name.clone(),
                target.url().to_string(),
            ]],
            view: "timeSeries".to_string(),
            stat: "Average".to_string(),
            period: config.dashboard_period.as_secs(),
        },
    }
}
