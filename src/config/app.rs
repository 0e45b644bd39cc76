use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use super::ConnectionSettings;

/// Everything the application persists between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub connection: ConnectionSettings,
    /// Registry name of the capture source
    pub source: String,
    /// Source-specific settings handed to its factory
    pub source_config: Value,
    pub take_dir: PathBuf,
    pub joint_config: PathBuf,
    pub sports_config: PathBuf,
    /// Replay tick at 100% speed
    pub replay_base_interval_ms: u64,
    pub sport: Option<String>,
    pub rigid_body: Option<String>,
    pub skeleton: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            source: "simulated".to_string(),
            source_config: json!({"mode": "periodic", "interval_ms": 10}),
            take_dir: PathBuf::from("saved_takes"),
            joint_config: PathBuf::from("config/skeleton_config.json"),
            sports_config: PathBuf::from("config/sports.json"),
            replay_base_interval_ms: 1,
            sport: None,
            rigid_body: None,
            skeleton: None,
        }
    }
}

/// Loads, caches and atomically rewrites the config file
pub struct AppConfigManager {
    config_path: PathBuf,
    state: Arc<RwLock<AppConfig>>,
}

impl AppConfigManager {
    /// In-memory state starts at defaults until `load()` is called
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            state: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub async fn ensure_config_file(&self) -> Result<()> {
        if !self.config_path.exists() {
            if let Some(parent) = self.config_path.parent() {
                fs::create_dir_all(parent).await
                    .context("Failed to create config directory")?;
            }

            let json = serde_json::to_string_pretty(&AppConfig::default())?;
            fs::write(&self.config_path, json).await
                .context("Failed to write default config")?;
            log::info!("Wrote default config to {:?}", self.config_path);
        }

        Ok(())
    }

    pub async fn load(&self) -> Result<AppConfig> {
        self.ensure_config_file().await?;

        let content = fs::read_to_string(&self.config_path).await
            .context("Failed to read config file")?;

        let config: AppConfig = serde_json::from_str(&content)
            .context("Failed to parse config JSON")?;

        *self.state.write().await = config.clone();
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        let config = self.state.read().await;
        let json = serde_json::to_string_pretty(&*config)?;

        let temp_path = self.config_path.with_extension("tmp");
        fs::write(&temp_path, json).await
            .context("Failed to write temporary config file")?;

        fs::rename(&temp_path, &self.config_path).await
            .context("Failed to atomically update config file")?;

        Ok(())
    }

    pub async fn get(&self) -> AppConfig {
        self.state.read().await.clone()
    }

    /// Apply a change and persist it
    pub async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        change(&mut *self.state.write().await);
        self.save().await
    }

    /// Relative paths in the config are taken relative to the config file
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.parent() {
            Some(parent) => parent.join(path),
            None => path.to_path_buf(),
        }
    }
}
