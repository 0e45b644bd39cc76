use anyhow::Result;
use std::sync::Arc;
use crate::assets::{AssetKind, AssetMaps, AssetResolver};
use crate::config::{NamingConvention, SportMetrics};
use crate::core::{FrameData, FrameWindow, MetricCalculator, MetricsData};
use crate::metrics::{MetricDefinition, RigidBodyMetrics, SkeletonMetrics};
use crate::observability::StageMetrics;

/// Metrics for one frame from both calculators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameMetrics {
    pub frame_number: i32,
    pub rigid_body: MetricsData,
    pub skeleton: MetricsData,
}

/// Consumer-side metric computation over the incoming frame stream
///
/// Keeps the two most recent frames and only computes once both exist, so the
/// first output belongs to the third frame after a reset. Subjects are chosen
/// by name and re-resolved every time the asset maps change.
pub struct DataProcessor {
    resolver: AssetResolver,
    rigid_body: RigidBodyMetrics,
    skeleton: SkeletonMetrics,
    previous: Option<FrameData>,
    second_previous: Option<FrameData>,
    rigid_body_name: Option<String>,
    skeleton_name: Option<String>,
    stage: Arc<StageMetrics>,
}

impl DataProcessor {
    pub fn new(resolver: AssetResolver) -> Self {
        Self {
            resolver,
            rigid_body: RigidBodyMetrics::new(),
            skeleton: SkeletonMetrics::new(),
            previous: None,
            second_previous: None,
            rigid_body_name: None,
            skeleton_name: None,
            stage: Arc::new(StageMetrics::new("metrics")),
        }
    }

    pub fn with_metrics(mut self, stage: Arc<StageMetrics>) -> Self {
        self.stage = stage;
        self
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    /// Replace all asset maps and re-resolve the current selections
    pub fn set_assets(&mut self, maps: AssetMaps) {
        self.resolver.set_maps(maps);
        self.reselect();
    }

    pub fn set_metric_settings(
        &mut self,
        rigid_body: Vec<MetricDefinition>,
        skeleton: Vec<MetricDefinition>,
    ) {
        log::info!(
            "Metric settings: {} rigid body, {} skeleton",
            rigid_body.len(),
            skeleton.len()
        );
        self.rigid_body.set_metric_settings(rigid_body);
        self.skeleton.set_metric_settings(skeleton);
    }

    pub fn set_sport(&mut self, sport: SportMetrics) {
        self.set_metric_settings(sport.rigid, sport.body);
    }

    /// Select the rigid body by name, returns the resolved id
    pub fn select_rigid_body(&mut self, name: Option<&str>) -> Option<i32> {
        self.rigid_body_name = name.map(str::to_string);
        self.reselect();
        self.rigid_body.selected_subject()
    }

    /// Select the skeleton by name, returns the resolved id
    pub fn select_skeleton(&mut self, name: Option<&str>) -> Option<i32> {
        self.skeleton_name = name.map(str::to_string);
        self.reselect();
        self.skeleton.selected_subject()
    }

    pub fn selected_rigid_body(&self) -> Option<i32> {
        self.rigid_body.selected_subject()
    }

    pub fn selected_skeleton(&self) -> Option<i32> {
        self.skeleton.selected_subject()
    }

    /// Load the joint mapping for a convention; the old mapping stays on failure
    pub fn set_naming_convention(&mut self, convention: NamingConvention) -> Result<()> {
        self.resolver.set_naming_convention(convention)?;
        self.skeleton
            .set_joint_mapping(self.resolver.joint_mapping().clone());
        Ok(())
    }

    fn reselect(&mut self) {
        let rigid_body = self.resolve(AssetKind::RigidBody, self.rigid_body_name.as_deref());
        self.rigid_body.select_subject(rigid_body);

        let skeleton = self.resolve(AssetKind::Skeleton, self.skeleton_name.as_deref());
        self.skeleton.select_subject(skeleton);
        self.skeleton.set_bone_names(
            skeleton
                .map(|id| self.resolver.bone_names(id))
                .unwrap_or_default(),
        );
    }

    fn resolve(&self, kind: AssetKind, name: Option<&str>) -> Option<i32> {
        let name = name?;
        let id = self.resolver.resolve_asset_by_name(kind, name);
        if id.is_none() {
            log::warn!("Asset '{}' not found, {:?} selection cleared", name, kind);
        }
        id
    }

    /// Feed one frame; returns metrics once two earlier frames are held
    pub fn process_frame(&mut self, frame: &FrameData) -> Option<FrameMetrics> {
        let result = match (&self.previous, &self.second_previous) {
            (Some(previous), Some(second_previous)) => {
                let start = self.stage.start_processing();
                let window = FrameWindow::full(frame, previous, second_previous);
                let metrics = FrameMetrics {
                    frame_number: frame.frame_number,
                    rigid_body: self.rigid_body.compute(&window),
                    skeleton: self.skeleton.compute(&FrameWindow::single(frame)),
                };
                self.stage.finish_processing(start);
                Some(metrics)
            }
            _ => {
                log::debug!("Not enough frames to compute metrics");
                None
            }
        };

        self.second_previous = self.previous.take();
        self.previous = Some(frame.clone());
        result
    }

    /// Forget frame history, keeping maps, selections and definitions
    pub fn reset(&mut self) {
        self.previous = None;
        self.second_previous = None;
    }
}
