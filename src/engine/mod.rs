pub mod kernel;
pub mod processor;
pub mod recorder;
pub mod replay;
pub mod state;

pub use kernel::{KernelOutput, StreamingKernel};
pub use processor::{DataProcessor, FrameMetrics};
pub use recorder::Recorder;
pub use replay::ReplayController;
pub use state::{RecordingState, ReplayState};
