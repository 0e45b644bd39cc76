use serde::{Deserialize, Serialize};

/// Replay controller states
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ReplayState {
    #[default]
    Idle,
    Replaying {
        speed_percent: f64,
    },
}

impl ReplayState {
    pub fn can_transition_to(&self, target: &ReplayState) -> bool {
        use ReplayState::*;

        matches!((self, target), (Idle, Replaying { .. }) | (Replaying { .. }, Idle))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Replaying { .. } => "Replaying",
        }
    }
}

/// Recorder states, independent of replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

impl RecordingState {
    pub fn can_transition_to(&self, target: &RecordingState) -> bool {
        use RecordingState::*;

        matches!((self, target), (Idle, Recording) | (Recording, Idle))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Recording => "Recording",
        }
    }
}
