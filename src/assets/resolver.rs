use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use crate::config::NamingConvention;
use crate::hal::{DataDescription, DataDescriptions};
use super::naming::JointMapping;

/// Id -> name maps for every asset the capture server describes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMaps {
    #[serde(default)]
    pub rigid_bodies: BTreeMap<i32, String>,
    #[serde(default)]
    pub skeletons: BTreeMap<i32, String>,
    /// Skeleton id -> (bone id -> bone name)
    #[serde(default)]
    pub bones: BTreeMap<i32, BTreeMap<i32, String>>,
}

impl AssetMaps {
    pub fn from_descriptions(descriptions: &DataDescriptions) -> Self {
        let mut maps = AssetMaps::default();

        for description in &descriptions.descriptions {
            match description {
                DataDescription::RigidBody(rb) => {
                    maps.rigid_bodies.insert(rb.id, rb.name.clone());
                }
                DataDescription::Skeleton(skeleton) => {
                    maps.skeletons.insert(skeleton.id, skeleton.name.clone());
                    let bones = maps.bones.entry(skeleton.id).or_default();
                    for bone in &skeleton.bones {
                        bones.insert(bone.id, bone.name.clone());
                    }
                }
                DataDescription::Other { .. } => {}
            }
        }

        maps
    }

    pub fn is_empty(&self) -> bool {
        self.rigid_bodies.is_empty() && self.skeletons.is_empty()
    }
}

/// Kind of selectable subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    RigidBody,
    Skeleton,
}

/// Resolves asset names to ids and owns the joint mapping for the active convention
///
/// Reverse maps are always rebuilt from the forward maps in full. When two
/// assets share a name the one with the highest id wins.
#[derive(Debug, Default)]
pub struct AssetResolver {
    maps: AssetMaps,
    rigid_body_ids: HashMap<String, i32>,
    skeleton_ids: HashMap<String, i32>,
    bone_ids: HashMap<i32, HashMap<String, i32>>,
    joint_config_path: Option<PathBuf>,
    joint_mapping: JointMapping,
}

impl AssetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that reads joint mappings from the given file
    pub fn with_joint_config(path: impl Into<PathBuf>) -> Self {
        Self {
            joint_config_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn set_rigid_body_map(&mut self, rigid_bodies: BTreeMap<i32, String>) {
        self.maps.rigid_bodies = rigid_bodies;
        self.rebuild_reverse_maps();
    }

    pub fn set_skeleton_map(&mut self, skeletons: BTreeMap<i32, String>) {
        self.maps.skeletons = skeletons;
        self.rebuild_reverse_maps();
    }

    pub fn set_bone_map(&mut self, bones: BTreeMap<i32, BTreeMap<i32, String>>) {
        self.maps.bones = bones;
        self.rebuild_reverse_maps();
    }

    /// Replace all three forward maps at once
    pub fn set_maps(&mut self, maps: AssetMaps) {
        self.maps = maps;
        self.rebuild_reverse_maps();
    }

    pub fn rebuild_reverse_maps(&mut self) {
        self.rigid_body_ids = self
            .maps
            .rigid_bodies
            .iter()
            .map(|(id, name)| (name.clone(), *id))
            .collect();

        self.skeleton_ids = self
            .maps
            .skeletons
            .iter()
            .map(|(id, name)| (name.clone(), *id))
            .collect();

        self.bone_ids = self
            .maps
            .bones
            .iter()
            .map(|(skeleton_id, bones)| {
                let reversed = bones.iter().map(|(id, name)| (name.clone(), *id)).collect();
                (*skeleton_id, reversed)
            })
            .collect();
    }

    pub fn maps(&self) -> &AssetMaps {
        &self.maps
    }

    /// Id of the named asset, None when the name is unknown
    pub fn resolve_asset_by_name(&self, kind: AssetKind, name: &str) -> Option<i32> {
        match kind {
            AssetKind::RigidBody => self.rigid_body_ids.get(name).copied(),
            AssetKind::Skeleton => self.skeleton_ids.get(name).copied(),
        }
    }

    pub fn resolve_bone(&self, skeleton_id: i32, name: &str) -> Option<i32> {
        self.bone_ids.get(&skeleton_id)?.get(name).copied()
    }

    /// Bone name -> id for one skeleton, empty when the skeleton is unknown
    pub fn bone_names(&self, skeleton_id: i32) -> HashMap<String, i32> {
        self.bone_ids.get(&skeleton_id).cloned().unwrap_or_default()
    }

    /// Selectable rigid body names, sorted
    pub fn rigid_body_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rigid_body_ids.keys().cloned().collect();
        names.sort();
        names
    }

    /// Selectable skeleton names, sorted
    pub fn skeleton_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.skeleton_ids.keys().cloned().collect();
        names.sort();
        names
    }

    /// Reload the joint mapping for a convention, replacing the previous one
    ///
    /// On failure the previous mapping stays active.
    pub fn set_naming_convention(&mut self, convention: NamingConvention) -> Result<()> {
        let path = self
            .joint_config_path
            .as_ref()
            .context("No joint mapping file configured")?;

        let mapping = JointMapping::load(path, convention)?;
        log::info!(
            "Loaded {} joint mappings for {} from {:?}",
            mapping.len(),
            convention,
            path
        );
        self.joint_mapping = mapping;
        Ok(())
    }

    pub fn joint_mapping(&self) -> &JointMapping {
        &self.joint_mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AssetResolver {
        let mut resolver = AssetResolver::new();
        resolver.set_rigid_body_map(BTreeMap::from([(1, "Bat".to_string()), (5, "Ball".to_string())]));
        resolver.set_skeleton_map(BTreeMap::from([(2, "Batter".to_string())]));
        resolver.set_bone_map(BTreeMap::from([(
            2,
            BTreeMap::from([(10, "Hips".to_string()), (11, "Spine".to_string())]),
        )]));
        resolver
    }

    #[test]
    fn test_resolve_by_name() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_asset_by_name(AssetKind::RigidBody, "Ball"), Some(5));
        assert_eq!(resolver.resolve_asset_by_name(AssetKind::Skeleton, "Batter"), Some(2));
        assert_eq!(resolver.resolve_asset_by_name(AssetKind::Skeleton, "Ball"), None);
        assert_eq!(resolver.resolve_bone(2, "Spine"), Some(11));
        assert_eq!(resolver.resolve_bone(3, "Spine"), None);
    }

    #[test]
    fn test_replacing_map_drops_stale_names() {
        let mut resolver = resolver();
        resolver.set_rigid_body_map(BTreeMap::from([(7, "Racket".to_string())]));

        assert_eq!(resolver.resolve_asset_by_name(AssetKind::RigidBody, "Ball"), None);
        assert_eq!(resolver.resolve_asset_by_name(AssetKind::RigidBody, "Racket"), Some(7));
        assert_eq!(resolver.rigid_body_names(), vec!["Racket".to_string()]);
    }

    #[test]
    fn test_naming_convention_without_file() {
        let mut resolver = resolver();
        assert!(resolver.set_naming_convention(NamingConvention::Fbx).is_err());
        assert!(resolver.joint_mapping().is_empty());
    }

    #[test]
    fn test_asset_maps_json_keys() {
        let maps = resolver().maps().clone();
        let json = serde_json::to_value(&maps).unwrap();
        assert_eq!(json["rigidBodies"]["5"], "Ball");
        assert_eq!(json["bones"]["2"]["10"], "Hips");

        let back: AssetMaps = serde_json::from_value(json).unwrap();
        assert_eq!(back, maps);
    }
}
