pub mod definition;
pub mod kinematics;
pub mod rigid_body;
pub mod skeleton;

pub use definition::{decode_definitions, BonePair, MetricDefinition, RawMetricDefinition};
pub use kinematics::EulerAngles;
pub use rigid_body::RigidBodyMetrics;
pub use skeleton::SkeletonMetrics;
