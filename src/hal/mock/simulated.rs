use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use glam::{DQuat, DVec3};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use crate::hal::{
    ConnectParams, DataDescription, DataDescriptions, FrameCallback, RawFrame, RawRigidBody,
    RawSkeleton, RigidBodyDescription, SdkClient, ServerDescription, SkeletonDescription,
};

const MANUAL_POLL: Duration = Duration::from_millis(20);

/// (name, parent bone id, rest position) for the simulated skeleton, bone ids start at 1
const BONES: [(&str, i32, [f64; 3]); 4] = [
    ("Hips", -1, [0.0, 1.0, 0.0]),
    ("Spine", 1, [0.0, 1.2, 0.0]),
    ("Neck", 2, [0.0, 1.5, 0.0]),
    ("Head", 3, [0.0, 1.65, 0.0]),
];

#[derive(Debug, Clone, PartialEq)]
enum SimulationMode {
    Periodic { interval_ms: u64 },
    Manual,
}

/// Injects frames into a manual-mode simulated SDK
///
/// Frames pushed before the source reports connected may be discarded.
#[derive(Debug, Clone)]
pub struct SimulatedHandle {
    tx: Sender<RawFrame>,
    rx: Receiver<RawFrame>,
}

impl SimulatedHandle {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn push(&self, frame: RawFrame) -> Result<()> {
        self.tx
            .send(frame)
            .map_err(|_| anyhow!("Simulated SDK frame channel closed"))
    }
}

impl Default for SimulatedHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process stand-in for the vendor SDK
///
/// Periodic mode emits a body translating along X and a skeleton bending at
/// the spine; manual mode delivers whatever is pushed through its handle.
pub struct SimulatedSdk {
    mode: SimulationMode,
    max_frames: Option<u64>,
    duplicate_every: Option<u64>,
    fail_connect: bool,
    no_host: bool,
    fail_descriptions: bool,
    rigid_body_id: i32,
    rigid_body_name: String,
    skeleton_id: i32,
    skeleton_name: String,
    handle: SimulatedHandle,
    callback: Option<FrameCallback>,
    connected: bool,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SimulatedSdk {
    pub fn new() -> Self {
        Self {
            mode: SimulationMode::Periodic { interval_ms: 10 },
            max_frames: None,
            duplicate_every: None,
            fail_connect: false,
            no_host: false,
            fail_descriptions: false,
            rigid_body_id: 1,
            rigid_body_name: "SimBody".to_string(),
            skeleton_id: 1,
            skeleton_name: "SimSkeleton".to_string(),
            handle: SimulatedHandle::new(),
            callback: None,
            connected: false,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Manual mode fed by an existing handle
    pub fn with_handle(handle: SimulatedHandle) -> Self {
        let mut sdk = Self::new();
        sdk.mode = SimulationMode::Manual;
        sdk.handle = handle;
        sdk
    }

    pub fn from_config(config: &Value) -> Result<Self> {
        let mut sdk = Self::new();
        sdk.configure(config)?;
        Ok(sdk)
    }

    pub fn configure(&mut self, config: &Value) -> Result<()> {
        if self.connected {
            bail!("Cannot configure simulated SDK while connected");
        }

        let mode = config["mode"].as_str().unwrap_or("periodic");
        self.mode = match mode {
            "periodic" => {
                let interval_ms = config["interval_ms"].as_u64().unwrap_or(10);
                SimulationMode::Periodic { interval_ms }
            }
            "manual" => SimulationMode::Manual,
            _ => bail!("Unknown simulation mode: {}", mode),
        };

        self.max_frames = config["max_frames"].as_u64();
        self.duplicate_every = config["duplicate_every"].as_u64().filter(|n| *n > 0);
        self.fail_connect = config["fail_connect"].as_bool().unwrap_or(false);
        self.no_host = config["no_host"].as_bool().unwrap_or(false);
        self.fail_descriptions = config["fail_descriptions"].as_bool().unwrap_or(false);

        if let Some(id) = config["rigid_body_id"].as_i64() {
            self.rigid_body_id = id as i32;
        }
        if let Some(name) = config["rigid_body_name"].as_str() {
            self.rigid_body_name = name.to_string();
        }
        if let Some(id) = config["skeleton_id"].as_i64() {
            self.skeleton_id = id as i32;
        }
        if let Some(name) = config["skeleton_name"].as_str() {
            self.skeleton_name = name.to_string();
        }

        Ok(())
    }

    pub fn handle(&self) -> SimulatedHandle {
        self.handle.clone()
    }

    fn start_worker(&mut self, callback: FrameCallback) -> Result<()> {
        self.running.store(true, Ordering::Release);
        let running = self.running.clone();

        let worker = match self.mode {
            SimulationMode::Periodic { interval_ms } => {
                let generator = FrameGenerator {
                    interval: Duration::from_millis(interval_ms),
                    rigid_body_id: self.rigid_body_id,
                    skeleton_id: self.skeleton_id,
                };
                let max_frames = self.max_frames;
                let duplicate_every = self.duplicate_every;

                thread::Builder::new()
                    .name("simulated-sdk".to_string())
                    .spawn(move || {
                        let mut emitted = 0u64;
                        while running.load(Ordering::Acquire) {
                            if max_frames.is_some_and(|max| emitted >= max) {
                                break;
                            }
                            thread::sleep(generator.interval);
                            if !running.load(Ordering::Acquire) {
                                break;
                            }

                            let frame = generator.frame(emitted);
                            callback(&frame);
                            emitted += 1;

                            if duplicate_every.is_some_and(|n| emitted % n == 0) {
                                callback(&frame);
                            }
                        }
                    })
            }
            SimulationMode::Manual => {
                let rx = self.handle.rx.clone();
                thread::Builder::new()
                    .name("simulated-sdk".to_string())
                    .spawn(move || {
                        while running.load(Ordering::Acquire) {
                            match rx.recv_timeout(MANUAL_POLL) {
                                Ok(frame) => callback(&frame),
                                Err(RecvTimeoutError::Timeout) => continue,
                                Err(RecvTimeoutError::Disconnected) => break,
                            }
                        }
                    })
            }
        }
        .context("Failed to spawn simulated SDK thread")?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop_worker(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| anyhow!("Simulated SDK thread panicked"))?;
        }
        Ok(())
    }

    fn descriptions(&self) -> DataDescriptions {
        let bones = BONES
            .iter()
            .enumerate()
            .map(|(index, (name, parent_id, _))| RigidBodyDescription {
                id: index as i32 + 1,
                name: name.to_string(),
                parent_id: *parent_id,
                marker_positions: Vec::new(),
            })
            .collect();

        DataDescriptions {
            descriptions: vec![
                DataDescription::Other {
                    kind: "MarkerSet".to_string(),
                },
                DataDescription::RigidBody(RigidBodyDescription {
                    id: self.rigid_body_id,
                    name: self.rigid_body_name.clone(),
                    parent_id: -1,
                    marker_positions: vec![
                        DVec3::new(0.05, 0.0, 0.0),
                        DVec3::new(-0.05, 0.0, 0.0),
                        DVec3::new(0.0, 0.0, 0.08),
                    ],
                }),
                DataDescription::Skeleton(SkeletonDescription {
                    id: self.skeleton_id,
                    name: self.skeleton_name.clone(),
                    bones,
                }),
            ],
        }
    }
}

impl Default for SimulatedSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimulatedSdk {
    fn drop(&mut self) {
        if let Err(e) = self.stop_worker() {
            log::warn!("{:#}", e);
        }
    }
}

impl SdkClient for SimulatedSdk {
    fn set_frame_callback(&mut self, callback: FrameCallback) {
        self.callback = Some(callback);
    }

    fn connect(&mut self, params: &ConnectParams) -> Result<()> {
        if self.connected {
            bail!("Simulated SDK already connected");
        }
        if self.fail_connect {
            bail!("Simulated connection refused by {}", params.server_address);
        }
        let callback = self
            .callback
            .clone()
            .context("Frame callback must be set before connect")?;

        log::debug!(
            "Simulated SDK connecting {} -> {} ({:?})",
            params.client_address,
            params.server_address,
            params.connection_type
        );
        self.start_worker(callback)?;
        self.connected = true;
        Ok(())
    }

    fn server_description(&mut self) -> Result<ServerDescription> {
        if !self.connected {
            bail!("Simulated SDK not connected");
        }
        Ok(ServerDescription {
            host_present: !self.no_host,
            host_app: "Simulated Motive".to_string(),
            host_version: [3, 1, 0, 0],
        })
    }

    fn data_descriptions(&mut self) -> Result<DataDescriptions> {
        if !self.connected {
            bail!("Simulated SDK not connected");
        }
        if self.fail_descriptions {
            bail!("Simulated data description request failed");
        }
        Ok(self.descriptions())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        self.stop_worker()
    }
}

/// Deterministic synthetic motion
struct FrameGenerator {
    interval: Duration,
    rigid_body_id: i32,
    skeleton_id: i32,
}

impl FrameGenerator {
    fn frame(&self, index: u64) -> RawFrame {
        let t = index as f64 * self.interval.as_secs_f64();

        let body_position = DVec3::new(0.5 * t, 1.0, 0.0);
        let body_orientation = DQuat::from_rotation_y((10.0 * t).to_radians());

        let bend = DQuat::from_rotation_x((20.0 * (t * 2.0).sin()).to_radians());
        let bones = BONES
            .iter()
            .enumerate()
            .map(|(index, (_, _, rest))| {
                let orientation = if index == 0 { DQuat::IDENTITY } else { bend };
                raw_rigid_body(index as i32 + 1, DVec3::from_array(*rest), orientation)
            })
            .collect();

        RawFrame {
            frame_number: index as i32 + 1,
            timestamp: t,
            rigid_bodies: vec![raw_rigid_body(self.rigid_body_id, body_position, body_orientation)],
            skeletons: vec![RawSkeleton {
                id: self.skeleton_id,
                bones,
            }],
        }
    }
}

fn raw_rigid_body(id: i32, position: DVec3, orientation: DQuat) -> RawRigidBody {
    RawRigidBody::new(
        id,
        position.as_vec3().to_array(),
        orientation.as_quat().to_array(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn params() -> ConnectParams {
        ConnectParams::from(&crate::config::ConnectionSettings::default())
    }

    #[test]
    fn test_configure_modes() {
        let sdk = SimulatedSdk::from_config(&json!({"mode": "periodic", "interval_ms": 5})).unwrap();
        assert_eq!(sdk.mode, SimulationMode::Periodic { interval_ms: 5 });

        let sdk = SimulatedSdk::from_config(&json!({"mode": "manual"})).unwrap();
        assert_eq!(sdk.mode, SimulationMode::Manual);

        assert!(SimulatedSdk::from_config(&json!({"mode": "burst"})).is_err());
    }

    #[test]
    fn test_connect_requires_callback() {
        let mut sdk = SimulatedSdk::new();
        assert!(sdk.connect(&params()).is_err());
    }

    #[test]
    fn test_failure_injection() {
        let mut sdk = SimulatedSdk::from_config(&json!({"fail_connect": true})).unwrap();
        sdk.set_frame_callback(Arc::new(|_| {}));
        assert!(sdk.connect(&params()).is_err());

        let mut sdk = SimulatedSdk::from_config(&json!({"mode": "manual", "no_host": true})).unwrap();
        sdk.set_frame_callback(Arc::new(|_| {}));
        sdk.connect(&params()).unwrap();
        assert!(!sdk.server_description().unwrap().host_present);
        sdk.disconnect().unwrap();
    }

    #[test]
    fn test_with_handle_keeps_defaults() {
        let handle = SimulatedHandle::new();
        let mut sdk = SimulatedSdk::with_handle(handle.clone());
        assert_eq!(sdk.mode, SimulationMode::Manual);
        assert_eq!(sdk.rigid_body_name, "SimBody");
        assert!(sdk.max_frames.is_none());

        handle.push(RawFrame { frame_number: 7, ..RawFrame::default() }).unwrap();
        assert_eq!(sdk.handle().rx.try_recv().unwrap().frame_number, 7);
        assert!(sdk.data_descriptions().is_err());
    }

    #[test]
    fn test_manual_delivery() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();

        let handle = SimulatedHandle::new();
        let mut sdk = SimulatedSdk::with_handle(handle.clone());
        sdk.set_frame_callback(Arc::new(move |frame: &RawFrame| {
            sink.lock().unwrap().push(frame.frame_number);
        }));
        sdk.connect(&params()).unwrap();

        handle.push(RawFrame { frame_number: 1, ..RawFrame::default() }).unwrap();
        handle.push(RawFrame { frame_number: 2, ..RawFrame::default() }).unwrap();

        for _ in 0..100 {
            if received.lock().unwrap().len() == 2 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        sdk.disconnect().unwrap();

        assert_eq!(*received.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_periodic_stops_at_max_frames() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();

        let mut sdk = SimulatedSdk::from_config(&json!({
            "interval_ms": 1,
            "max_frames": 4,
            "duplicate_every": 2
        }))
        .unwrap();
        sdk.set_frame_callback(Arc::new(move |frame: &RawFrame| {
            sink.lock().unwrap().push(frame.frame_number);
        }));
        sdk.connect(&params()).unwrap();

        for _ in 0..200 {
            if received.lock().unwrap().len() == 6 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        sdk.disconnect().unwrap();

        assert_eq!(*received.lock().unwrap(), vec![1, 2, 2, 3, 4, 4]);
    }

    #[test]
    fn test_descriptions_cover_body_and_skeleton() {
        let mut sdk = SimulatedSdk::from_config(&json!({"mode": "manual"})).unwrap();
        sdk.set_frame_callback(Arc::new(|_| {}));
        sdk.connect(&params()).unwrap();

        let descriptions = sdk.data_descriptions().unwrap();
        assert_eq!(descriptions.len(), 3);
        let skeleton = descriptions
            .descriptions
            .iter()
            .find_map(|d| match d {
                DataDescription::Skeleton(s) => Some(s),
                _ => None,
            })
            .unwrap();
        assert_eq!(skeleton.bones.len(), BONES.len());
        assert_eq!(skeleton.bones[1].parent_id, 1);

        sdk.disconnect().unwrap();
    }
}
