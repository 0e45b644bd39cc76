use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use super::take::Take;

/// Directory of saved takes named `take_YYYYMMDD_HHMMSS.json`
#[derive(Debug, Clone)]
pub struct TakeStorage {
    storage_dir: PathBuf,
}

impl TakeStorage {
    /// Creates the storage directory if it doesn't exist
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&storage_dir)
            .context("Failed to create take storage directory")?;

        Ok(Self { storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Save under a name derived from the current local time
    pub fn save(&self, take: &Take) -> Result<PathBuf> {
        self.save_at(take, Local::now())
    }

    pub fn save_at(&self, take: &Take, time: DateTime<Local>) -> Result<PathBuf> {
        let path = self.unused_path(&format!("take_{}", time.format("%Y%m%d_%H%M%S")));
        let json = take.to_json_string()?;

        fs::write(&path, json)
            .context(format!("Failed to write take to {:?}", path))?;

        log::info!("Saved take with {} frames to {:?}", take.len(), path);
        Ok(path)
    }

    /// Load by file name inside the storage directory, or by path
    pub fn load(&self, name: impl AsRef<Path>) -> Result<Take> {
        Take::load(self.take_path(name.as_ref()))
    }

    pub fn delete(&self, name: impl AsRef<Path>) -> Result<()> {
        let path = self.take_path(name.as_ref());
        if path.exists() {
            fs::remove_file(&path)
                .context(format!("Failed to delete take at {:?}", path))?;
        }
        Ok(())
    }

    /// Saved take files, sorted by name
    pub fn list_all(&self) -> Result<Vec<PathBuf>> {
        let mut takes = Vec::new();

        if !self.storage_dir.exists() {
            return Ok(takes);
        }

        for entry in fs::read_dir(&self.storage_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                takes.push(path);
            }
        }

        takes.sort();
        Ok(takes)
    }

    fn take_path(&self, name: &Path) -> PathBuf {
        if name.is_absolute() || name.components().count() > 1 {
            name.to_path_buf()
        } else {
            self.storage_dir.join(name)
        }
    }

    fn unused_path(&self, stem: &str) -> PathBuf {
        let mut path = self.storage_dir.join(format!("{}.json", stem));
        let mut suffix = 1;
        while path.exists() {
            path = self.storage_dir.join(format!("{}_{}.json", stem, suffix));
            suffix += 1;
        }
        path
    }
}
