use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::assets::{AssetMaps, RenderTopology};
use crate::buffers::FrameBuffer;
use crate::core::{notify, AssetSnapshot, EventSender, FrameData, SourceEvent};
use crate::observability::StageMetrics;
use super::traits::{FrameCallback, MotionCaptureSource, SdkClient, SdkFactory};
use super::types::{ConnectParams, DataDescriptions, RawFrame, ServerDescription};

/// Connection lifecycle of a capture source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn can_transition_to(&self, target: &ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, target),
            (Disconnected, Connecting) |
            // Handshake failure reverts, success completes
            (Connecting, Disconnected) |
            (Connecting, Connected) |
            (Connected, Disconnected)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        }
    }
}

/// Adapter from an `SdkClient` to `MotionCaptureSource`
///
/// The SDK instance is created by the factory on connect and dropped on
/// disconnect. Frames from the SDK thread are converted, deduplicated into the
/// frame buffer and queued to the consumer as owned snapshots.
pub struct SdkSource {
    factory: SdkFactory,
    client: Option<Box<dyn SdkClient>>,
    state: ConnectionState,
    /// Incremented on every connect attempt, tags the frames of that connection
    session: u64,
    streaming: Arc<AtomicBool>,
    buffer: FrameBuffer,
    events: EventSender,
    ingest: Arc<StageMetrics>,
    server: Option<ServerDescription>,
    descriptions: Option<DataDescriptions>,
    assets: AssetSnapshot,
}

impl SdkSource {
    pub fn new(factory: SdkFactory, events: EventSender) -> Self {
        Self {
            factory,
            client: None,
            state: ConnectionState::Disconnected,
            session: 0,
            streaming: Arc::new(AtomicBool::new(false)),
            buffer: FrameBuffer::new(),
            events,
            ingest: Arc::new(StageMetrics::new("ingest")),
            server: None,
            descriptions: None,
            assets: AssetSnapshot::default(),
        }
    }

    /// Report ingest counters into a shared stage
    pub fn with_metrics(mut self, ingest: Arc<StageMetrics>) -> Self {
        self.ingest = ingest;
        self
    }

    pub fn server_description(&self) -> Option<&ServerDescription> {
        self.server.as_ref()
    }

    fn transition(&mut self, target: ConnectionState) -> Result<()> {
        if !self.state.can_transition_to(&target) {
            bail!(
                "Invalid connection transition {} -> {}",
                self.state.name(),
                target.name()
            );
        }
        log::info!("Capture source {} -> {}", self.state.name(), target.name());
        self.state = target;
        Ok(())
    }

    fn frame_callback(&self) -> FrameCallback {
        let session = self.session;
        let streaming = self.streaming.clone();
        let buffer = self.buffer.clone();
        let events = self.events.clone();
        let ingest = self.ingest.clone();

        Arc::new(move |raw: &RawFrame| {
            if !streaming.load(Ordering::Acquire) {
                return;
            }

            let start = ingest.start_processing();
            let frame = FrameData::from(raw);

            if !buffer.append(frame.clone()) {
                log::trace!("Dropped duplicate frame {}", frame.frame_number);
                ingest.record_dropped();
                return;
            }

            ingest.finish_processing(start);
            notify(&events, SourceEvent::Frame { session, frame });
        })
    }

    fn apply_descriptions(&mut self, descriptions: DataDescriptions) {
        log::info!("Retrieved {} data descriptions", descriptions.len());

        self.assets = AssetSnapshot {
            maps: AssetMaps::from_descriptions(&descriptions),
            topology: RenderTopology::from_descriptions(&descriptions),
        };
        self.descriptions = Some(descriptions);

        notify(&self.events, SourceEvent::AssetsChanged(self.assets.clone()));
    }

    async fn release(mut client: Box<dyn SdkClient>) {
        match tokio::task::spawn_blocking(move || client.disconnect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("SDK disconnect reported an error: {:#}", e),
            Err(e) => log::warn!("SDK disconnect task failed: {}", e),
        }
    }
}

fn handshake(
    client: &mut dyn SdkClient,
    params: &ConnectParams,
) -> Result<(ServerDescription, DataDescriptions)> {
    client
        .connect(params)
        .context(format!("Unable to connect to server {}", params.server_address))?;

    let server = client
        .server_description()
        .context("Unable to get server description")?;
    if !server.host_present {
        bail!("Server description reports no host present");
    }

    let descriptions = client
        .data_descriptions()
        .context("Unable to retrieve data descriptions")?;

    Ok((server, descriptions))
}

#[async_trait]
impl MotionCaptureSource for SdkSource {
    async fn connect(&mut self, params: ConnectParams) -> Result<()> {
        if self.state != ConnectionState::Disconnected {
            bail!("Cannot connect in state {}", self.state.name());
        }
        self.transition(ConnectionState::Connecting)?;
        self.session += 1;

        let mut client = match (self.factory)() {
            Ok(client) => client,
            Err(e) => {
                self.transition(ConnectionState::Disconnected)?;
                return Err(e.context("Failed to create SDK client"));
            }
        };
        client.set_frame_callback(self.frame_callback());

        let joined = tokio::task::spawn_blocking(move || {
            let result = handshake(client.as_mut(), &params);
            (client, result)
        })
        .await;

        let (client, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                self.transition(ConnectionState::Disconnected)?;
                return Err(anyhow!("SDK handshake task failed: {}", e));
            }
        };

        let (server, descriptions) = match result {
            Ok(handshake) => handshake,
            Err(e) => {
                Self::release(client).await;
                self.transition(ConnectionState::Disconnected)?;
                return Err(e);
            }
        };

        log::info!(
            "Connected to {} (ver. {})",
            server.host_app,
            server.version_string()
        );
        self.server = Some(server);
        self.client = Some(client);
        self.apply_descriptions(descriptions);

        self.streaming.store(true, Ordering::Release);
        self.transition(ConnectionState::Connected)?;
        notify(&self.events, SourceEvent::ConnectionChanged(true));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }

        self.streaming.store(false, Ordering::Release);
        if let Some(client) = self.client.take() {
            Self::release(client).await;
        }

        self.buffer.clear();
        self.server = None;
        self.descriptions = None;
        self.assets = AssetSnapshot::default();

        self.transition(ConnectionState::Disconnected)?;
        notify(&self.events, SourceEvent::ConnectionChanged(false));
        Ok(())
    }

    async fn refresh_descriptions(&mut self) -> Result<()> {
        if self.state != ConnectionState::Connected {
            bail!("Cannot refresh descriptions in state {}", self.state.name());
        }
        let mut client = self
            .client
            .take()
            .context("Connected source has no SDK client")?;

        let (client, result) = tokio::task::spawn_blocking(move || {
            let result = client.data_descriptions();
            (client, result)
        })
        .await
        .map_err(|e| anyhow!("SDK description task failed: {}", e))?;
        self.client = Some(client);

        self.apply_descriptions(result.context("Unable to retrieve data descriptions")?);
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn session(&self) -> Option<u64> {
        self.is_connected().then_some(self.session)
    }

    fn data_descriptions(&self) -> Option<DataDescriptions> {
        self.descriptions.clone()
    }

    fn asset_maps(&self) -> AssetMaps {
        self.assets.maps.clone()
    }

    fn topology(&self) -> RenderTopology {
        self.assets.topology.clone()
    }

    fn frame_buffer(&self) -> FrameBuffer {
        self.buffer.clone()
    }
}
