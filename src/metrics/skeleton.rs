use std::collections::HashMap;
use crate::assets::JointMapping;
use crate::core::{FrameData, FrameWindow, MetricCalculator, MetricsData, SkeletonData};
use super::definition::{BonePair, MetricDefinition};
use super::kinematics::{compute_horizontal_distance, compute_joint_angle};

/// Computes joint angles and forward lean for one skeleton
///
/// Bones are addressed either by position in the skeleton's bone list or by a
/// joint name resolved through the active naming convention.
#[derive(Debug, Default)]
pub struct SkeletonMetrics {
    selected: Option<i32>,
    definitions: Vec<MetricDefinition>,
    joint_mapping: JointMapping,
    /// Bone name -> bone id for the selected skeleton
    bone_ids: HashMap<String, i32>,
}

impl SkeletonMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// Replace the joint mapping wholesale
    pub fn set_joint_mapping(&mut self, mapping: JointMapping) {
        self.joint_mapping = mapping;
    }

    pub fn joint_mapping(&self) -> &JointMapping {
        &self.joint_mapping
    }

    /// Bone names of the selected skeleton, used to resolve joint-addressed metrics
    pub fn set_bone_names(&mut self, bone_ids: HashMap<String, i32>) {
        self.bone_ids = bone_ids;
    }

    pub fn compute_metrics(&self, current: &FrameData) -> MetricsData {
        self.compute(&FrameWindow::single(current))
    }

    fn resolve_bones(&self, bones: &BonePair, skeleton: &SkeletonData) -> Option<(usize, usize)> {
        let (first, second) = match bones {
            BonePair::Indices(first, second) => (*first, *second),
            BonePair::Joint(joint) => {
                let (first_name, second_name) = self.joint_mapping.bones_for(joint)?;
                let first_id = *self.bone_ids.get(first_name)?;
                let second_id = *self.bone_ids.get(second_name)?;
                (skeleton.bone_index(first_id)?, skeleton.bone_index(second_id)?)
            }
        };

        if first < skeleton.bones.len() && second < skeleton.bones.len() {
            Some((first, second))
        } else {
            None
        }
    }
}

impl MetricCalculator for SkeletonMetrics {
    fn set_metric_settings(&mut self, definitions: Vec<MetricDefinition>) {
        self.definitions = definitions;
    }

    fn select_subject(&mut self, subject: Option<i32>) {
        self.selected = subject;
    }

    fn selected_subject(&self) -> Option<i32> {
        self.selected
    }

    fn compute(&self, window: &FrameWindow<'_>) -> MetricsData {
        let Some(subject) = self.selected else {
            log::debug!("No skeleton selected for metric computation");
            return MetricsData::empty();
        };

        let current = window.current;
        // Single subject per call: the first skeleton carrying the selected id
        let Some(skeleton) = current.skeleton(subject) else {
            return MetricsData::empty();
        };

        let mut data = MetricsData::for_frame(current.frame_number);

        for definition in &self.definitions {
            match definition {
                MetricDefinition::Angle { bones, label } => {
                    if let Some((a, b)) = self.resolve_bones(bones, skeleton) {
                        let angle = compute_joint_angle(
                            skeleton.bones[a].orientation,
                            skeleton.bones[b].orientation,
                        );
                        data.insert(label.as_str(), angle);
                    }
                }
                MetricDefinition::Distance { bones, label } => {
                    if let Some((a, b)) = self.resolve_bones(bones, skeleton) {
                        let distance = compute_horizontal_distance(
                            skeleton.bones[a].position,
                            skeleton.bones[b].position,
                        );
                        data.insert(label.as_str(), distance);
                    }
                }
                _ => {}
            }
        }

        log::debug!("Skeleton metrics for frame {}: {:?}", current.frame_number, data.metrics);
        data
    }
}
