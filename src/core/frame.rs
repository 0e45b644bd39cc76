use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Pose of a single tracked rigid body (or skeleton bone) in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigidBodyData {
    /// Server-assigned id, unique within its context
    pub id: i32,

    /// Id of the parent body, -1 when there is none
    #[serde(default = "no_parent")]
    pub parent_id: i32,

    /// X, Y, Z position in meters
    pub position: DVec3,

    /// Unit quaternion, serialized as [x, y, z, w]
    pub orientation: DQuat,
}

fn no_parent() -> i32 {
    -1
}

impl RigidBodyData {
    pub fn new(id: i32, position: DVec3, orientation: DQuat) -> Self {
        Self {
            id,
            parent_id: -1,
            position,
            orientation,
        }
    }
}

impl Default for RigidBodyData {
    fn default() -> Self {
        Self {
            id: -1,
            parent_id: -1,
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
        }
    }
}

/// A skeleton is an ordered list of bones; the order is fixed per skeleton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonData {
    pub id: i32,
    pub bones: Vec<RigidBodyData>,
}

impl SkeletonData {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            bones: Vec::new(),
        }
    }

    /// Position of the bone with the given id in the ordered bone list
    pub fn bone_index(&self, bone_id: i32) -> Option<usize> {
        self.bones.iter().position(|b| b.id == bone_id)
    }
}

/// One frame of motion capture data as delivered by the capture server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameData {
    /// Frame number from the server, expected to increase
    pub frame_number: i32,

    /// Server timestamp in seconds
    pub timestamp: f64,

    #[serde(default)]
    pub rigid_bodies: Vec<RigidBodyData>,

    #[serde(default)]
    pub skeletons: Vec<SkeletonData>,
}

impl FrameData {
    pub fn new(frame_number: i32, timestamp: f64) -> Self {
        Self {
            frame_number,
            timestamp,
            rigid_bodies: Vec::new(),
            skeletons: Vec::new(),
        }
    }

    pub fn rigid_body(&self, id: i32) -> Option<&RigidBodyData> {
        self.rigid_bodies.iter().find(|rb| rb.id == id)
    }

    pub fn skeleton(&self, id: i32) -> Option<&SkeletonData> {
        self.skeletons.iter().find(|s| s.id == id)
    }
}
