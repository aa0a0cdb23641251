use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine settings.
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Size of the worker pool. `None` uses one worker per CPU.
    pub workers: Option<usize>,
    /// Run the nodes of a generation on the worker pool. When disabled every
    /// node runs on the calling thread, one after another.
    pub parallel: bool,
    /// Glob patterns over node kinds. Matching nodes are output nodes in
    /// addition to the ones set explicitly.
    pub output_kinds: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: None,
            parallel: true,
            output_kinds: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        tracing::debug!("Loaded configuration from {path}");
        Ok(config)
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_output_kind(mut self, pattern: impl Into<String>) -> Self {
        self.output_kinds.push(pattern.into());
        self
    }

    pub(crate) fn output_patterns(&self) -> Result<Vec<glob::Pattern>, ConfigError> {
        self.output_kinds
            .iter()
            .map(|kind| glob::Pattern::new(kind).map_err(ConfigError::from))
            .collect()
    }
}
