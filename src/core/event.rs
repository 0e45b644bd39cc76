use tokio::sync::mpsc;
use crate::assets::{AssetMaps, RenderTopology};
use super::FrameData;

/// Asset maps plus the render topology derived from the same descriptor set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetSnapshot {
    pub maps: AssetMaps,
    pub topology: RenderTopology,
}

/// Notifications queued from a producer (live I/O thread or replay task) to the consumer
///
/// Frames carry the id of the connection session or replay run that produced
/// them; the consumer drops frames whose session or run has ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Frame { session: u64, frame: FrameData },
    ReplayFrame { run: u64, frame: FrameData },
    AssetsChanged(AssetSnapshot),
    ConnectionChanged(bool),
    ReplayFinished { run: u64 },
}

pub type EventSender = mpsc::UnboundedSender<SourceEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SourceEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Queue an event; a closed channel only means the consumer is gone
pub fn notify(events: &EventSender, event: SourceEvent) -> bool {
    match events.send(event) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Event consumer gone, dropped {:?}", e.0);
            false
        }
    }
}
