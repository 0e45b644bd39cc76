use crate::core::{FrameData, FrameWindow, MetricCalculator, MetricsData, RigidBodyData};
use super::definition::MetricDefinition;
use super::kinematics::{
    compute_acceleration, compute_tilt, compute_velocity, EulerAngles,
};

/// Computes tilt, speed, acceleration and pose pass-through for one rigid body
#[derive(Debug, Default)]
pub struct RigidBodyMetrics {
    selected: Option<i32>,
    definitions: Vec<MetricDefinition>,
}

impl RigidBodyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// Compute from three consecutive frames, newest first
    pub fn compute_metrics(
        &self,
        current: &FrameData,
        previous: &FrameData,
        second_previous: &FrameData,
    ) -> MetricsData {
        self.compute(&FrameWindow::full(current, previous, second_previous))
    }

    fn find<'a>(frame: Option<&'a FrameData>, id: i32) -> Option<(&'a FrameData, &'a RigidBodyData)> {
        frame.and_then(|f| f.rigid_body(id).map(|rb| (f, rb)))
    }
}

impl MetricCalculator for RigidBodyMetrics {
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
            log::debug!("No rigid body selected for metric computation");
            return MetricsData::empty();
        };

        let current = window.current;
        let Some(body) = current.rigid_body(subject) else {
            return MetricsData::empty();
        };

        let previous = Self::find(window.previous, subject);
        let second_previous = Self::find(window.second_previous, subject);
        let angles = EulerAngles::from_quat(body.orientation);

        let mut data = MetricsData::for_frame(current.frame_number);

        for definition in &self.definitions {
            match definition {
                MetricDefinition::Tilt { label } => {
                    data.insert(label.as_str(), compute_tilt(&angles));
                }
                MetricDefinition::Velocity { label } => {
                    let velocity = match previous {
                        Some((prev_frame, prev_body)) => compute_velocity(
                            body.position,
                            prev_body.position,
                            current.timestamp - prev_frame.timestamp,
                        ),
                        None => 0.0,
                    };
                    data.insert(label.as_str(), velocity);
                }
                MetricDefinition::Acceleration { label } => {
                    let acceleration = match (previous, second_previous) {
                        (Some((prev_frame, prev_body)), Some((sec_frame, sec_body))) => {
                            compute_acceleration(
                                body.position,
                                prev_body.position,
                                sec_body.position,
                                current.timestamp - prev_frame.timestamp,
                                prev_frame.timestamp - sec_frame.timestamp,
                            )
                        }
                        _ => 0.0,
                    };
                    data.insert(label.as_str(), acceleration);
                }
                MetricDefinition::Position { labels } => {
                    for (label, value) in labels.iter().zip(body.position.to_array()) {
                        data.insert(label.as_str(), value);
                    }
                }
                MetricDefinition::Orientation { labels } => {
                    for (label, value) in labels.iter().zip(angles.to_array()) {
                        data.insert(label.as_str(), value);
                    }
                }
                MetricDefinition::Angle { .. } | MetricDefinition::Distance { .. } => {}
            }
        }

        log::debug!("Rigid body metrics for frame {}: {:?}", current.frame_number, data.metrics);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DQuat, DVec3, EulerRot};

    fn frame(number: i32, timestamp: f64, x: f64) -> FrameData {
        let mut frame = FrameData::new(number, timestamp);
        frame.rigid_bodies.push(RigidBodyData::new(5, DVec3::new(x, 0.0, 0.0), DQuat::IDENTITY));
        frame
    }

    fn calculator(definitions: Vec<MetricDefinition>) -> RigidBodyMetrics {
        let mut metrics = RigidBodyMetrics::new();
        metrics.set_metric_settings(definitions);
        metrics.select_subject(Some(5));
        metrics
    }

    #[test]
    fn test_no_selection_yields_empty() {
        let mut metrics = calculator(vec![MetricDefinition::Velocity { label: "v".into() }]);
        metrics.select_subject(None);

        let (a, b, c) = (frame(3, 0.2, 2.0), frame(2, 0.1, 1.0), frame(1, 0.0, 0.0));
        let data = metrics.compute_metrics(&a, &b, &c);
        assert!(data.is_empty());
        assert_eq!(data.id, None);
    }

    #[test]
    fn test_velocity_and_acceleration() {
        let metrics = calculator(vec![
            MetricDefinition::Velocity { label: "vx".into() },
            MetricDefinition::Acceleration { label: "ax".into() },
        ]);

        let (a, b, c) = (frame(3, 0.2, 3.0), frame(2, 0.1, 1.0), frame(1, 0.0, 0.0));
        let data = metrics.compute_metrics(&a, &b, &c);

        assert_eq!(data.id, Some(3));
        assert!((data.get("vx").unwrap() - 20.0).abs() < 1e-9);
        // (20 - 10) / 0.1
        assert!((data.get("ax").unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_timestamp_zeroes_velocity() {
        let metrics = calculator(vec![MetricDefinition::Velocity { label: "vx".into() }]);
        let (a, b, c) = (frame(3, 0.1, 3.0), frame(2, 0.1, 1.0), frame(1, 0.0, 0.0));
        assert_eq!(metrics.compute_metrics(&a, &b, &c).get("vx"), Some(0.0));
    }

    #[test]
    fn test_pose_pass_through() {
        let metrics = calculator(vec![
            MetricDefinition::Position { labels: vec!["px".into(), "py".into()] },
            MetricDefinition::Orientation { labels: vec!["pitch".into(), "yaw".into(), "roll".into()] },
            MetricDefinition::Tilt { label: "tilt".into() },
        ]);

        let mut current = FrameData::new(9, 1.0);
        current.rigid_bodies.push(RigidBodyData::new(
            5,
            DVec3::new(0.5, 1.5, -2.0),
            DQuat::from_euler(EulerRot::YXZ, 0.0, 30f64.to_radians(), 0.0),
        ));

        let data = metrics.compute(&FrameWindow::single(&current));
        assert_eq!(data.get("px"), Some(0.5));
        assert_eq!(data.get("py"), Some(1.5));
        assert!(data.get("pz").is_none());
        assert!((data.get("pitch").unwrap() - 30.0).abs() < 1e-6);
        assert!((data.get("tilt").unwrap() - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_subject_missing_from_previous_frame() {
        let metrics = calculator(vec![MetricDefinition::Velocity { label: "vx".into() }]);
        let current = frame(2, 0.1, 1.0);
        let previous = FrameData::new(1, 0.0);

        let data = metrics.compute(&FrameWindow {
            current: &current,
            previous: Some(&previous),
            second_previous: None,
        });
        assert_eq!(data.get("vx"), Some(0.0));
    }
}
