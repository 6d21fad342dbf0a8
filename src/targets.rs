//! Target list loading

use crate::errors::{CanaryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A single site to probe, identified by its URL
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target {
    url: String,
}

impl Target {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Read the target list file, failing before any probing can happen.
///
/// The file must be a JSON array of strings. Entries are passed through in
/// declaration order without deduplication or URL validation.
pub async fn load_targets(path: &Path) -> Result<Vec<Target>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CanaryError::TargetList {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let targets = parse_targets(&contents).map_err(|e| CanaryError::TargetList {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    debug!("Loaded {} targets from {}", targets.len(), path.display());
    Ok(targets)
}

/// Parse a JSON array of URL strings into targets
pub fn parse_targets(contents: &str) -> std::result::Result<Vec<Target>, serde_json::Error> {
    serde_json::from_str::<Vec<Target>>(contents)
}
