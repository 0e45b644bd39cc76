use std::sync::{Arc, Mutex, MutexGuard};
use crate::core::FrameData;

/// Append-only store of delivered frames shared between the SDK thread and consumers
///
/// The lock is held only across the push or the copy, never across computation.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Arc<Mutex<Vec<FrameData>>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FrameData>> {
        self.frames
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Push a frame unless it repeats the last buffered frame number
    ///
    /// Only the most recent entry is compared; an out-of-order frame with an
    /// older number is accepted.
    pub fn append(&self, frame: FrameData) -> bool {
        let mut frames = self.lock();
        if let Some(last) = frames.last() {
            if last.frame_number == frame.frame_number {
                return false;
            }
        }
        frames.push(frame);
        true
    }

    /// Copy of the newest frame, or an empty frame when nothing was buffered
    pub fn latest(&self) -> FrameData {
        self.lock().last().cloned().unwrap_or_default()
    }

    /// Copy of every buffered frame in delivery order
    pub fn history(&self) -> Vec<FrameData> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Clone for FrameBuffer {
    fn clone(&self) -> Self {
        Self {
            frames: self.frames.clone(),
        }
    }
}
