pub mod app;
pub mod settings;
pub mod sports;

pub use app::{AppConfig, AppConfigManager};
pub use settings::{ConnectionSettings, ConnectionType, NamingConvention};
pub use sports::{Sport, SportCatalog, SportMetrics};
