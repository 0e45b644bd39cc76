pub mod event;
pub mod frame;
pub mod metrics_data;
pub mod node;

pub use event::{event_channel, notify, AssetSnapshot, EventReceiver, EventSender, SourceEvent};
pub use frame::{FrameData, RigidBodyData, SkeletonData};
pub use metrics_data::MetricsData;
pub use node::{FrameWindow, MetricCalculator};
