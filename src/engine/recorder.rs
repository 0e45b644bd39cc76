use anyhow::{bail, Result};
use crate::core::{AssetSnapshot, FrameData};
use crate::storage::Take;
use super::state::RecordingState;

/// Captures every frame on the consumer path, live or replayed, into a take
#[derive(Debug, Default)]
pub struct Recorder {
    state: RecordingState,
    frames: Vec<FrameData>,
    assets: AssetSnapshot,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn transition(&mut self, target: RecordingState) -> Result<()> {
        if !self.state.can_transition_to(&target) {
            bail!("Cannot go from {} to {}", self.state.name(), target.name());
        }
        log::info!("Recorder {} -> {}", self.state.name(), target.name());
        self.state = target;
        Ok(())
    }

    /// Start a take with the assets known right now
    pub fn start_recording(&mut self, assets: AssetSnapshot) -> Result<()> {
        self.transition(RecordingState::Recording)?;
        self.frames.clear();
        self.assets = assets;
        Ok(())
    }

    pub fn record_frame(&mut self, frame: &FrameData) {
        if self.is_recording() {
            self.frames.push(frame.clone());
        }
    }

    /// Asset changes during a recording replace the captured maps and topology
    pub fn update_assets(&mut self, assets: &AssetSnapshot) {
        if self.is_recording() {
            self.assets = assets.clone();
        }
    }

    pub fn stop_recording(&mut self) -> Result<Take> {
        self.transition(RecordingState::Idle)?;
        let frames = std::mem::take(&mut self.frames);
        let assets = std::mem::take(&mut self.assets);
        Ok(Take::new(assets, frames))
    }
}
