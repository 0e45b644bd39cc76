use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use crate::assets::{AssetMaps, RenderTopology};
use crate::core::{AssetSnapshot, FrameData};

/// A recorded session: asset maps, every frame in order, and render topology
///
/// Immutable once written; loading parses the whole file before anything is
/// handed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Take {
    #[serde(default)]
    pub rigid_bodies: BTreeMap<i32, String>,
    #[serde(default)]
    pub skeletons: BTreeMap<i32, String>,
    #[serde(default)]
    pub bones: BTreeMap<i32, BTreeMap<i32, String>>,
    #[serde(default)]
    pub frames: Vec<FrameData>,
    #[serde(default)]
    pub gl_assets: RenderTopology,
}

impl Take {
    pub fn new(assets: AssetSnapshot, frames: Vec<FrameData>) -> Self {
        let AssetSnapshot { maps, topology } = assets;
        Self {
            rigid_bodies: maps.rigid_bodies,
            skeletons: maps.skeletons,
            bones: maps.bones,
            frames,
            gl_assets: topology,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .context(format!("Failed to read take from {:?}", path))?;
        Self::from_json_str(&json)
            .context(format!("Failed to parse take {:?}", path))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Malformed take JSON")
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize take")
    }

    pub fn asset_maps(&self) -> AssetMaps {
        AssetMaps {
            rigid_bodies: self.rigid_bodies.clone(),
            skeletons: self.skeletons.clone(),
            bones: self.bones.clone(),
        }
    }

    pub fn asset_snapshot(&self) -> AssetSnapshot {
        AssetSnapshot {
            maps: self.asset_maps(),
            topology: self.gl_assets.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
