use std::collections::BTreeMap;
use std::sync::Arc;
use super::StageMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSnapshot {
    pub stage: String,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub avg_latency_us: u64,
}

/// Shared registry of stage counters, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    stages: BTreeMap<String, Arc<StageMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metrics: Arc<StageMetrics>) {
        self.stages.insert(metrics.stage().to_string(), metrics);
    }

    /// Counters for a stage, registering it on first use
    pub fn stage(&mut self, stage: &str) -> Arc<StageMetrics> {
        self.stages
            .entry(stage.to_string())
            .or_insert_with(|| Arc::new(StageMetrics::new(stage)))
            .clone()
    }

    pub fn get(&self, stage: &str) -> Option<Arc<StageMetrics>> {
        self.stages.get(stage).cloned()
    }

    pub fn snapshot(&self) -> Vec<StageSnapshot> {
        self.stages
            .values()
            .map(|metrics| StageSnapshot {
                stage: metrics.stage().to_string(),
                frames_processed: metrics.frames_processed(),
                frames_dropped: metrics.frames_dropped(),
                avg_latency_us: metrics.avg_latency_us(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stage_is_shared() {
        let mut collector = MetricsCollector::new();
        let ingest = collector.stage("ingest");
        ingest.record_latency(Duration::from_micros(5));

        let again = collector.stage("ingest");
        assert_eq!(again.frames_processed(), 1);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].stage, "ingest");
    }
}
