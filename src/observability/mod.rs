pub mod metrics;
pub mod collector;
pub mod monitor;

pub use metrics::StageMetrics;
pub use collector::{MetricsCollector, StageSnapshot};
pub use monitor::StreamMonitor;
