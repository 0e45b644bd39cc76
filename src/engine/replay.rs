use anyhow::{bail, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use crate::core::{notify, AssetSnapshot, EventSender, SourceEvent};
use crate::storage::Take;
use super::state::ReplayState;

struct ReplayRun {
    id: u64,
    cancel: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Re-emits a loaded take through the live event path at a chosen speed
///
/// One tokio task per run emits frames strictly in order. Each tick is
/// scheduled `interval` after the previous tick started, so time spent
/// emitting is absorbed rather than added. Every run gets a fresh id; events
/// from any other run are stale once it has been stopped or replaced.
pub struct ReplayController {
    state: ReplayState,
    take: Option<Arc<Take>>,
    events: EventSender,
    base_interval: Duration,
    run: Option<ReplayRun>,
    next_run: u64,
}

impl ReplayController {
    /// `base_interval` is the tick length at 100% speed
    pub fn new(events: EventSender, base_interval: Duration) -> Self {
        Self {
            state: ReplayState::Idle,
            take: None,
            events,
            base_interval,
            run: None,
            next_run: 1,
        }
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn is_replaying(&self) -> bool {
        matches!(self.state, ReplayState::Replaying { .. })
    }

    pub fn take(&self) -> Option<&Take> {
        self.take.as_deref()
    }

    /// Parse a take file and make it current
    ///
    /// Nothing changes unless the whole file parses. A running replay is
    /// stopped before the new take replaces it.
    pub fn load_take(&mut self, path: &Path) -> Result<AssetSnapshot> {
        let take = Take::load(path)?;
        log::info!("Loaded take {:?} with {} frames", path, take.len());
        Ok(self.set_take(take))
    }

    pub fn set_take(&mut self, take: Take) -> AssetSnapshot {
        self.stop_replay();
        let assets = take.asset_snapshot();
        self.take = Some(Arc::new(take));
        assets
    }

    /// Tick length for a speed given in percent
    pub fn nominal_interval(&self, speed_percent: f64) -> Result<Duration> {
        if !speed_percent.is_finite() || speed_percent <= 0.0 {
            bail!("Invalid replay speed {}%", speed_percent);
        }
        Ok(self.base_interval.mul_f64(100.0 / speed_percent))
    }

    /// Start replaying the current take; Ok(false) when it has no frames
    pub fn start_replay(&mut self, speed_percent: f64) -> Result<bool> {
        if self.is_replaying() {
            bail!("Replay already running");
        }
        let Some(take) = self.take.clone() else {
            bail!("No take loaded");
        };
        if take.is_empty() {
            log::warn!("No frames to replay");
            return Ok(false);
        }

        let interval = self.nominal_interval(speed_percent)?;
        let target = ReplayState::Replaying { speed_percent };
        if !self.state.can_transition_to(&target) {
            bail!("Cannot go from {} to {}", self.state.name(), target.name());
        }

        let id = self.next_run;
        self.next_run += 1;
        let cancel = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_replay(
            id,
            take,
            interval,
            cancel.clone(),
            self.events.clone(),
        ));

        log::info!("Replay run {} started at {}% ({:?} per frame)", id, speed_percent, interval);
        self.run = Some(ReplayRun { id, cancel, task });
        self.state = target;
        Ok(true)
    }

    pub fn stop_replay(&mut self) {
        if let Some(run) = self.run.take() {
            run.cancel.store(true, Ordering::Release);
            run.task.abort();
        }
        if self.is_replaying() {
            log::info!("Replay stopped");
            self.state = ReplayState::Idle;
        }
    }

    /// True while `run` is the replay in progress
    pub fn is_current(&self, run: u64) -> bool {
        self.run.as_ref().is_some_and(|current| current.id == run)
    }

    /// Handle a `ReplayFinished` event; false if it came from a superseded run
    pub fn on_finished(&mut self, run: u64) -> bool {
        if !self.is_current(run) {
            return false;
        }
        self.run = None;
        self.state = ReplayState::Idle;
        log::info!("Replay run {} finished", run);
        true
    }
}

impl Drop for ReplayController {
    fn drop(&mut self) {
        self.stop_replay();
    }
}

async fn run_replay(
    run: u64,
    take: Arc<Take>,
    interval: Duration,
    cancel: Arc<AtomicBool>,
    events: EventSender,
) {
    let mut frames = take.frames.iter();

    loop {
        if cancel.load(Ordering::Acquire) {
            return;
        }
        let tick = Instant::now();

        let Some(frame) = frames.next() else {
            notify(&events, SourceEvent::ReplayFinished { run });
            return;
        };
        if !notify(&events, SourceEvent::ReplayFrame { run, frame: frame.clone() }) {
            return;
        }

        sleep_until(tick + interval).await;
    }
}
