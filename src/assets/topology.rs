use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::hal::{DataDescription, DataDescriptions};

/// Marker displacements of one rigid body relative to its centroid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigidBodyOffsets {
    #[serde(rename = "bodyID")]
    pub body_id: i32,
    pub marker_offsets: Vec<DVec3>,
}

/// Static topology the renderer needs to draw skeletons and rigid bodies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTopology {
    /// Per skeleton, (parent index, child index) pairs into its bone list
    #[serde(default)]
    pub skeletons: Vec<Vec<(usize, usize)>>,
    #[serde(default)]
    pub rb_offsets: Vec<RigidBodyOffsets>,
}

impl RenderTopology {
    pub fn from_descriptions(descriptions: &DataDescriptions) -> Self {
        let mut topology = RenderTopology::default();

        for description in &descriptions.descriptions {
            match description {
                DataDescription::Skeleton(skeleton) => {
                    let index_of: HashMap<i32, usize> = skeleton
                        .bones
                        .iter()
                        .enumerate()
                        .map(|(index, bone)| (bone.id, index))
                        .collect();

                    let pairs = skeleton
                        .bones
                        .iter()
                        .enumerate()
                        .filter(|(_, bone)| bone.parent_id != -1)
                        .filter_map(|(child, bone)| {
                            index_of.get(&bone.parent_id).map(|parent| (*parent, child))
                        })
                        .collect();

                    topology.skeletons.push(pairs);
                }
                DataDescription::RigidBody(rb) => {
                    topology.rb_offsets.push(RigidBodyOffsets {
                        body_id: rb.id,
                        marker_offsets: centroid_offsets(&rb.marker_positions),
                    });
                }
                DataDescription::Other { .. } => {}
            }
        }

        topology
    }

    pub fn offsets_for(&self, body_id: i32) -> Option<&RigidBodyOffsets> {
        self.rb_offsets.iter().find(|o| o.body_id == body_id)
    }
}

fn centroid_offsets(markers: &[DVec3]) -> Vec<DVec3> {
    if markers.is_empty() {
        return Vec::new();
    }
    let centroid = markers.iter().copied().sum::<DVec3>() / markers.len() as f64;
    markers.iter().map(|m| *m - centroid).collect()
}
