use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Labeled metric values computed for one subject from one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsData {
    /// Frame number the values were computed at, None when nothing was computed
    pub id: Option<i32>,

    /// Metric label -> value
    pub metrics: HashMap<String, f64>,
}

impl MetricsData {
    /// Result carrying no values, returned when a calculator has nothing to compute
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_frame(frame_number: i32) -> Self {
        Self {
            id: Some(frame_number),
            metrics: HashMap::new(),
        }
    }

    pub fn insert(&mut self, label: impl Into<String>, value: f64) {
        self.metrics.insert(label.into(), value);
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.metrics.get(label).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }
}
