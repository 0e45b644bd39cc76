use super::MetricsCollector;

/// Renders stage counters as a plain text report
pub struct StreamMonitor {
    collector: MetricsCollector,
}

impl StreamMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();

        if snapshot.is_empty() {
            return "No stages registered".to_string();
        }

        let mut report = String::from("=== Stream Metrics ===\n");

        for stage in snapshot.iter() {
            report.push_str(&format!(
                "\n[{}]\n  Frames: {} processed, {} dropped\n  Avg Latency: {}μs\n",
                stage.stage, stage.frames_processed, stage.frames_dropped, stage.avg_latency_us
            ));
        }

        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
