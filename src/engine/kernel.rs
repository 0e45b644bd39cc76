use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::time::Duration;
use crate::buffers::FrameBuffer;
use crate::config::{ConnectionSettings, SportMetrics};
use crate::core::{event_channel, AssetSnapshot, EventReceiver, FrameData, SourceEvent};
use crate::hal::{ConnectParams, MotionCaptureSource, SdkFactory, SdkSource};
use crate::observability::MetricsCollector;
use crate::storage::TakeStorage;
use super::processor::{DataProcessor, FrameMetrics};
use super::recorder::Recorder;
use super::replay::ReplayController;

/// What the kernel hands to its consumer
#[derive(Debug, Clone, PartialEq)]
pub enum KernelOutput {
    Metrics(FrameMetrics),
    /// New asset maps and topology with the selectable names
    AssetsUpdated {
        assets: AssetSnapshot,
        rigid_bodies: Vec<String>,
        skeletons: Vec<String>,
    },
    ConnectionChanged(bool),
    ReplayFinished,
    TakeSaved(PathBuf),
}

/// Single consumer that owns the capture source, metric processor, recorder,
/// replay controller and take storage
///
/// Live and replayed frames arrive on the same queue and take the same path.
pub struct StreamingKernel {
    source: Box<dyn MotionCaptureSource>,
    processor: DataProcessor,
    recorder: Recorder,
    replay: ReplayController,
    storage: TakeStorage,
    events: EventReceiver,
    pending: VecDeque<KernelOutput>,
    assets: AssetSnapshot,
    collector: MetricsCollector,
}

impl StreamingKernel {
    pub fn new(
        factory: SdkFactory,
        processor: DataProcessor,
        storage: TakeStorage,
        replay_base_interval: Duration,
    ) -> Self {
        let (events_tx, events) = event_channel();
        let mut collector = MetricsCollector::new();

        let source = SdkSource::new(factory, events_tx.clone())
            .with_metrics(collector.stage("ingest"));
        let processor = processor.with_metrics(collector.stage("metrics"));

        Self {
            source: Box::new(source),
            processor,
            recorder: Recorder::new(),
            replay: ReplayController::new(events_tx, replay_base_interval),
            storage,
            events,
            pending: VecDeque::new(),
            assets: AssetSnapshot::default(),
            collector,
        }
    }

    /// Connect to the capture server; failures are logged and reported as false
    pub async fn connect(&mut self, settings: &ConnectionSettings) -> bool {
        if let Err(e) = self.processor.set_naming_convention(settings.naming_convention) {
            log::warn!("Keeping previous joint mapping: {:#}", e);
        }
        self.processor.reset();

        match self.source.connect(ConnectParams::from(settings)).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Connection failed: {:#}", e);
                false
            }
        }
    }

    /// Disconnect; a recording in progress is finalized first
    pub async fn disconnect(&mut self) {
        if self.recorder.is_recording() {
            if let Err(e) = self.stop_recording() {
                log::error!("Failed to save take on disconnect: {:#}", e);
            }
        }
        if let Err(e) = self.source.disconnect().await {
            log::error!("Disconnect failed: {:#}", e);
        }
    }

    /// Ask the server for its descriptor list again
    pub async fn refresh_assets(&mut self) -> bool {
        match self.source.refresh_descriptions().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Descriptor refresh failed: {:#}", e);
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_connected()
    }

    /// Frames delivered on the current live connection
    pub fn frame_buffer(&self) -> FrameBuffer {
        self.source.frame_buffer()
    }

    pub fn set_sport(&mut self, sport: SportMetrics) {
        self.processor.set_sport(sport);
    }

    pub fn processor(&self) -> &DataProcessor {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut DataProcessor {
        &mut self.processor
    }

    pub fn replay(&self) -> &ReplayController {
        &self.replay
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn storage(&self) -> &TakeStorage {
        &self.storage
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    /// Load a take by file name in the storage directory or by path
    ///
    /// On failure nothing changes and false is returned.
    pub fn load_take(&mut self, name: impl AsRef<Path>) -> bool {
        let path = match name.as_ref() {
            p if p.is_absolute() || p.components().count() > 1 => p.to_path_buf(),
            p => self.storage.storage_dir().join(p),
        };

        match self.replay.load_take(&path) {
            Ok(assets) => {
                self.processor.reset();
                let output = self.apply_assets(assets);
                self.pending.push_back(output);
                true
            }
            Err(e) => {
                log::error!("Failed to load take: {:#}", e);
                false
            }
        }
    }

    /// Start replaying the loaded take; false if nothing was started
    pub fn start_replay(&mut self, speed_percent: f64) -> bool {
        self.processor.reset();
        match self.replay.start_replay(speed_percent) {
            Ok(started) => started,
            Err(e) => {
                log::error!("Cannot start replay: {:#}", e);
                false
            }
        }
    }

    pub fn stop_replay(&mut self) {
        self.replay.stop_replay();
    }

    pub fn start_recording(&mut self) -> Result<()> {
        self.recorder.start_recording(self.assets.clone())
    }

    /// Stop recording and save the take, returning its path
    pub fn stop_recording(&mut self) -> Result<PathBuf> {
        let take = self.recorder.stop_recording()?;
        let path = self.storage.save(&take).context("Failed to save take")?;
        self.pending.push_back(KernelOutput::TakeSaved(path.clone()));
        Ok(path)
    }

    /// Wait for the next consumer-facing output
    pub async fn next_output(&mut self) -> Option<KernelOutput> {
        loop {
            if let Some(output) = self.pending.pop_front() {
                return Some(output);
            }
            let event = self.events.recv().await?;
            if let Some(output) = self.handle_event(event) {
                return Some(output);
            }
        }
    }

    /// Next output if one is ready without waiting
    pub fn try_next_output(&mut self) -> Option<KernelOutput> {
        loop {
            if let Some(output) = self.pending.pop_front() {
                return Some(output);
            }
            let event = self.events.try_recv().ok()?;
            if let Some(output) = self.handle_event(event) {
                return Some(output);
            }
        }
    }

    fn handle_event(&mut self, event: SourceEvent) -> Option<KernelOutput> {
        match event {
            SourceEvent::Frame { session, frame } => {
                if self.source.session() != Some(session) {
                    log::trace!("Dropped frame {} from closed session {}", frame.frame_number, session);
                    return None;
                }
                self.consume_frame(&frame)
            }
            SourceEvent::ReplayFrame { run, frame } => {
                if !self.replay.is_current(run) {
                    log::trace!("Dropped frame {} from stopped replay run {}", frame.frame_number, run);
                    return None;
                }
                self.consume_frame(&frame)
            }
            SourceEvent::AssetsChanged(assets) => Some(self.apply_assets(assets)),
            SourceEvent::ConnectionChanged(connected) => {
                Some(KernelOutput::ConnectionChanged(connected))
            }
            SourceEvent::ReplayFinished { run } => {
                self.replay.on_finished(run).then_some(KernelOutput::ReplayFinished)
            }
        }
    }

    fn consume_frame(&mut self, frame: &FrameData) -> Option<KernelOutput> {
        self.recorder.record_frame(frame);
        self.processor.process_frame(frame).map(KernelOutput::Metrics)
    }

    fn apply_assets(&mut self, assets: AssetSnapshot) -> KernelOutput {
        self.processor.set_assets(assets.maps.clone());
        self.recorder.update_assets(&assets);
        self.assets = assets.clone();

        let resolver = self.processor.resolver();
        KernelOutput::AssetsUpdated {
            assets,
            rigid_bodies: resolver.rigid_body_names(),
            skeletons: resolver.skeleton_names(),
        }
    }
}
