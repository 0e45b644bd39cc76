pub mod assets;
pub mod buffers;
pub mod config;
pub mod core;
pub mod engine;
pub mod hal;
pub mod metrics;
pub mod observability;
pub mod storage;
