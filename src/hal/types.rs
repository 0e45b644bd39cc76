use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use crate::config::{ConnectionSettings, ConnectionType};
use crate::core::{FrameData, RigidBodyData, SkeletonData};

/// Addresses and transport handed to the SDK on connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
    pub server_address: String,
    pub client_address: String,
    pub connection_type: ConnectionType,
}

impl From<&ConnectionSettings> for ConnectParams {
    fn from(settings: &ConnectionSettings) -> Self {
        Self {
            server_address: settings.server_address.clone(),
            client_address: settings.client_address.clone(),
            connection_type: settings.connection_type,
        }
    }
}

/// What the capture server reports about itself after connecting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerDescription {
    pub host_present: bool,
    pub host_app: String,
    pub host_version: [u8; 4],
}

impl ServerDescription {
    pub fn version_string(&self) -> String {
        let [a, b, c, d] = self.host_version;
        format!("{}.{}.{}.{}", a, b, c, d)
    }
}

/// Descriptor of a rigid body or of one skeleton bone
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyDescription {
    pub id: i32,
    pub name: String,
    pub parent_id: i32,
    /// Marker positions in the body's local frame
    pub marker_positions: Vec<DVec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonDescription {
    pub id: i32,
    pub name: String,
    /// Bones in streaming order
    pub bones: Vec<RigidBodyDescription>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataDescription {
    RigidBody(RigidBodyDescription),
    Skeleton(SkeletonDescription),
    /// Marker sets, force plates and other descriptors this crate does not use
    Other { kind: String },
}

/// The descriptor list retrieved from the server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataDescriptions {
    pub descriptions: Vec<DataDescription>,
}

impl DataDescriptions {
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

/// Rigid body sample in the SDK's native single precision layout
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawRigidBody {
    pub id: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub qx: f32,
    pub qy: f32,
    pub qz: f32,
    pub qw: f32,
}

impl RawRigidBody {
    pub fn new(id: i32, position: [f32; 3], orientation: [f32; 4]) -> Self {
        let [x, y, z] = position;
        let [qx, qy, qz, qw] = orientation;
        Self { id, x, y, z, qx, qy, qz, qw }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSkeleton {
    pub id: i32,
    pub bones: Vec<RawRigidBody>,
}

/// One frame as handed to the SDK's frame callback
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    pub frame_number: i32,
    pub timestamp: f64,
    pub rigid_bodies: Vec<RawRigidBody>,
    pub skeletons: Vec<RawSkeleton>,
}

impl From<&RawRigidBody> for RigidBodyData {
    fn from(raw: &RawRigidBody) -> Self {
        RigidBodyData::new(
            raw.id,
            DVec3::new(raw.x as f64, raw.y as f64, raw.z as f64),
            DQuat::from_xyzw(raw.qx as f64, raw.qy as f64, raw.qz as f64, raw.qw as f64),
        )
    }
}

impl From<&RawFrame> for FrameData {
    fn from(raw: &RawFrame) -> Self {
        let mut frame = FrameData::new(raw.frame_number, raw.timestamp);
        frame.rigid_bodies = raw.rigid_bodies.iter().map(RigidBodyData::from).collect();
        frame.skeletons = raw
            .skeletons
            .iter()
            .map(|skeleton| SkeletonData {
                id: skeleton.id,
                bones: skeleton.bones.iter().map(RigidBodyData::from).collect(),
            })
            .collect();
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_conversion() {
        let raw = RawFrame {
            frame_number: 12,
            timestamp: 0.25,
            rigid_bodies: vec![RawRigidBody::new(5, [1.0, 2.0, 3.0], [0.0, 0.0, 0.0, 1.0])],
            skeletons: vec![RawSkeleton {
                id: 1,
                bones: vec![
                    RawRigidBody::new(1, [0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]),
                    RawRigidBody::new(2, [0.0, 1.5, 0.0], [0.0, 0.0, 0.0, 1.0]),
                ],
            }],
        };

        let frame = FrameData::from(&raw);
        assert_eq!(frame.frame_number, 12);
        assert_eq!(frame.timestamp, 0.25);
        assert_eq!(frame.rigid_body(5).unwrap().position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(frame.rigid_body(5).unwrap().orientation, DQuat::IDENTITY);

        let skeleton = frame.skeleton(1).unwrap();
        assert_eq!(skeleton.bones.len(), 2);
        assert_eq!(skeleton.bones[1].id, 2);
        assert_eq!(skeleton.bones[1].parent_id, -1);
    }

    #[test]
    fn test_connect_params_from_settings() {
        let settings = ConnectionSettings::default();
        let params = ConnectParams::from(&settings);
        assert_eq!(params.server_address, "127.0.0.1");
        assert_eq!(params.connection_type, ConnectionType::Multicast);
    }
}
