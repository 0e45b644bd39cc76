use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use crate::metrics::{decode_definitions, MetricDefinition};

/// One sport and the raw metric definitions it enables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sport {
    pub name: String,
    #[serde(default)]
    pub rigid_metrics: Vec<Value>,
    #[serde(default)]
    pub body_metrics: Vec<Value>,
}

/// Decoded definition lists for both calculators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SportMetrics {
    pub rigid: Vec<MetricDefinition>,
    pub body: Vec<MetricDefinition>,
}

impl Sport {
    /// Decode both lists; malformed entries are skipped with a warning
    pub fn metrics(&self) -> SportMetrics {
        SportMetrics {
            rigid: decode_definitions(&self.rigid_metrics),
            body: decode_definitions(&self.body_metrics),
        }
    }
}

/// The sports file: `{ "sports": [ { "name", "rigidMetrics", "bodyMetrics" } ] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SportCatalog {
    #[serde(default)]
    pub sports: Vec<Sport>,
}

impl SportCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .context(format!("Failed to read sports catalog from {:?}", path))?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse sports catalog JSON")
    }

    pub fn names(&self) -> Vec<&str> {
        self.sports.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sport(&self, name: &str) -> Option<&Sport> {
        self.sports.iter().find(|s| s.name == name)
    }
}
