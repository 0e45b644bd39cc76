use super::{FrameData, MetricsData};
use crate::metrics::MetricDefinition;

/// Consecutive frames handed to a calculator, newest first
#[derive(Debug, Clone, Copy)]
pub struct FrameWindow<'a> {
    pub current: &'a FrameData,
    pub previous: Option<&'a FrameData>,
    pub second_previous: Option<&'a FrameData>,
}

impl<'a> FrameWindow<'a> {
    pub fn single(current: &'a FrameData) -> Self {
        Self {
            current,
            previous: None,
            second_previous: None,
        }
    }

    pub fn full(
        current: &'a FrameData,
        previous: &'a FrameData,
        second_previous: &'a FrameData,
    ) -> Self {
        Self {
            current,
            previous: Some(previous),
            second_previous: Some(second_previous),
        }
    }
}

/// Base trait for the per-subject metric calculators
///
/// Implementations never fail: anything that cannot be computed for a frame
/// yields an empty result or a zeroed value.
pub trait MetricCalculator: Send {
    /// Replace the active definition list wholesale
    fn set_metric_settings(&mut self, definitions: Vec<MetricDefinition>);

    /// Select the subject id to compute for, None clears the selection
    fn select_subject(&mut self, subject: Option<i32>);

    fn selected_subject(&self) -> Option<i32>;

    /// Compute all active metrics for the selected subject
    fn compute(&self, window: &FrameWindow<'_>) -> MetricsData;
}
