pub mod lifecycle;
pub mod mock;
pub mod registry;
pub mod traits;
pub mod types;

pub use lifecycle::{ConnectionState, SdkSource};
pub use registry::SourceRegistry;
pub use traits::{FrameCallback, MotionCaptureSource, SdkClient, SdkFactory};
pub use types::{
    ConnectParams, DataDescription, DataDescriptions, RawFrame, RawRigidBody, RawSkeleton,
    RigidBodyDescription, ServerDescription, SkeletonDescription,
};
