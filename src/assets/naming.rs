use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use crate::config::NamingConvention;

/// Joint name -> bone names used to measure that joint, for one naming convention
///
/// File layout:
/// `{ "<Convention>": { "joints": { "<Joint>": ["<bone>", "<bone>"] } } }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointMapping {
    convention: Option<NamingConvention>,
    joints: HashMap<String, Vec<String>>,
}

impl JointMapping {
    pub fn from_joints(joints: HashMap<String, Vec<String>>) -> Self {
        Self {
            convention: None,
            joints,
        }
    }

    pub fn load(path: impl AsRef<Path>, convention: NamingConvention) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .context(format!("Failed to read joint mapping from {:?}", path))?;
        Self::from_json_str(&json, convention)
    }

    pub fn from_json_str(json: &str, convention: NamingConvention) -> Result<Self> {
        let root: Value = serde_json::from_str(json)
            .context("Failed to parse joint mapping JSON")?;

        let mut joints = HashMap::new();
        match root[convention.as_str()]["joints"].as_object() {
            Some(entries) => {
                for (joint, bones) in entries {
                    let names = bones
                        .as_array()
                        .map(|list| {
                            list.iter()
                                .filter_map(|b| b.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default();
                    joints.insert(joint.clone(), names);
                }
            }
            None => log::warn!("No joint mappings defined for {}", convention),
        }

        Ok(Self {
            convention: Some(convention),
            joints,
        })
    }

    pub fn convention(&self) -> Option<NamingConvention> {
        self.convention
    }

    /// The two bones that define a joint, if the joint lists at least two
    pub fn bones_for(&self, joint: &str) -> Option<(&str, &str)> {
        match self.joints.get(joint)?.as_slice() {
            [first, second, ..] => Some((first.as_str(), second.as_str())),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}
