pub mod simulated;

pub use simulated::{SimulatedHandle, SimulatedSdk};
