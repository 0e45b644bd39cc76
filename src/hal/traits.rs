use async_trait::async_trait;
use anyhow::Result;
use std::sync::Arc;
use crate::assets::{AssetMaps, RenderTopology};
use crate::buffers::FrameBuffer;
use super::types::{ConnectParams, DataDescriptions, RawFrame, ServerDescription};
use super::lifecycle::ConnectionState;

/// Invoked on the SDK's own I/O thread for every received frame
pub type FrameCallback = Arc<dyn Fn(&RawFrame) + Send + Sync>;

/// Boundary over a vendor capture SDK binding
///
/// Every call may block; callers run them off the async runtime.
pub trait SdkClient: Send {
    /// Must be set before `connect`
    fn set_frame_callback(&mut self, callback: FrameCallback);

    fn connect(&mut self, params: &ConnectParams) -> Result<()>;

    fn server_description(&mut self) -> Result<ServerDescription>;

    fn data_descriptions(&mut self) -> Result<DataDescriptions>;

    /// Stop delivery and release the SDK session; no callback fires afterwards
    fn disconnect(&mut self) -> Result<()>;
}

/// Creates a fresh SDK instance for each connection
pub type SdkFactory = Arc<dyn Fn() -> Result<Box<dyn SdkClient>> + Send + Sync>;

/// Capability interface the rest of the system uses to talk to a capture source
///
/// Frames and descriptor changes are not returned from here; they are queued
/// as `SourceEvent`s on the channel the source was built with.
#[async_trait]
pub trait MotionCaptureSource: Send {
    /// Connect and fetch descriptors; on error the source stays disconnected
    async fn connect(&mut self, params: ConnectParams) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;

    /// Re-fetch descriptors and publish them as an asset change
    async fn refresh_descriptions(&mut self) -> Result<()>;

    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Id carried by frames of the current connection, None while disconnected
    fn session(&self) -> Option<u64>;

    fn data_descriptions(&self) -> Option<DataDescriptions>;

    fn asset_maps(&self) -> AssetMaps;

    fn topology(&self) -> RenderTopology;

    /// Shared handle to every frame delivered on this connection
    fn frame_buffer(&self) -> FrameBuffer;
}
