use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire form of one metric definition as found in the sports catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetricDefinition {
    pub class: String,
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
}

/// How a skeleton metric addresses its two bones
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BonePair {
    /// Positions in the skeleton's ordered bone list
    Indices(usize, usize),
    /// Joint name looked up in the active naming convention's mapping
    Joint(String),
}

/// A metric definition decoded once from configuration
#[derive(Debug, Clone, PartialEq)]
pub enum MetricDefinition {
    /// Combined pitch/roll tilt of a rigid body, yaw excluded
    Tilt { label: String },
    Velocity { label: String },
    /// Rate of change of speed magnitude
    Acceleration { label: String },
    /// Up to three position components, mapped onto labels in x, y, z order
    Position { labels: Vec<String> },
    /// Up to three Euler angles, mapped onto labels in pitch, yaw, roll order
    Orientation { labels: Vec<String> },
    /// Relative rotation between two bones in degrees
    Angle { bones: BonePair, label: String },
    /// Horizontal (X-Z) distance between two bones in centimeters
    Distance { bones: BonePair, label: String },
}

impl MetricDefinition {
    pub fn decode(raw: &RawMetricDefinition) -> Result<Self> {
        let first_label = || {
            raw.labels
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("Metric '{}' has no labels", raw.class))
        };

        let definition = match raw.class.as_str() {
            "tilt" => MetricDefinition::Tilt { label: first_label()? },
            "velocity" => MetricDefinition::Velocity { label: first_label()? },
            "acceleration" => MetricDefinition::Acceleration { label: first_label()? },
            "position" => MetricDefinition::Position {
                labels: raw.labels.iter().take(3).cloned().collect(),
            },
            "orientation" => MetricDefinition::Orientation {
                labels: raw.labels.iter().take(3).cloned().collect(),
            },
            "angle" => MetricDefinition::Angle {
                bones: Self::decode_bones(raw)?,
                label: first_label()?,
            },
            "distance" => MetricDefinition::Distance {
                bones: Self::decode_bones(raw)?,
                label: first_label()?,
            },
            other => bail!("Unknown metric class: {}", other),
        };

        Ok(definition)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let raw: RawMetricDefinition = serde_json::from_value(value.clone())
            .context("Malformed metric definition")?;
        Self::decode(&raw)
    }

    fn decode_bones(raw: &RawMetricDefinition) -> Result<BonePair> {
        let joint = raw
            .configuration
            .as_ref()
            .and_then(|c| c["joint"].as_str());
        if let Some(joint) = joint {
            return Ok(BonePair::Joint(joint.to_string()));
        }

        if raw.ids.len() < 2 {
            bail!("Metric '{}' needs two bone ids, got {}", raw.class, raw.ids.len());
        }
        let index = |id: i64| {
            usize::try_from(id).map_err(|_| anyhow!("Invalid bone index {}", id))
        };
        Ok(BonePair::Indices(index(raw.ids[0])?, index(raw.ids[1])?))
    }

    pub fn class(&self) -> &'static str {
        match self {
            MetricDefinition::Tilt { .. } => "tilt",
            MetricDefinition::Velocity { .. } => "velocity",
            MetricDefinition::Acceleration { .. } => "acceleration",
            MetricDefinition::Position { .. } => "position",
            MetricDefinition::Orientation { .. } => "orientation",
            MetricDefinition::Angle { .. } => "angle",
            MetricDefinition::Distance { .. } => "distance",
        }
    }

    /// True for the classes computed from skeleton bones
    pub fn is_skeletal(&self) -> bool {
        matches!(self, MetricDefinition::Angle { .. } | MetricDefinition::Distance { .. })
    }
}

/// Decode a definition list, dropping entries that cannot be decoded
///
/// A bad entry never invalidates the rest of the list; it is logged and skipped
/// so the configuration stays data-driven.
pub fn decode_definitions(values: &[Value]) -> Vec<MetricDefinition> {
    values
        .iter()
        .filter_map(|value| match MetricDefinition::from_json(value) {
            Ok(definition) => Some(definition),
            Err(e) => {
                log::warn!("Skipping metric definition {}: {:#}", value, e);
                None
            }
        })
        .collect()
}
