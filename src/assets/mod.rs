pub mod naming;
pub mod resolver;
pub mod topology;

pub use naming::JointMapping;
pub use resolver::{AssetKind, AssetMaps, AssetResolver};
pub use topology::{RenderTopology, RigidBodyOffsets};
