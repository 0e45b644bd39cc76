#![allow(dead_code)]

use mocaplab::hal::mock::{SimulatedHandle, SimulatedSdk};
use mocaplab::hal::{RawFrame, RawRigidBody, RawSkeleton, SdkClient, SdkFactory};
use serde_json::{json, Value};
use std::sync::Arc;

/// Factory for manual-mode simulated clients fed by `handle`
pub fn manual_factory(handle: SimulatedHandle) -> SdkFactory {
    manual_factory_with(handle, json!({}))
}

/// Same, with extra simulation settings such as failure injection
pub fn manual_factory_with(handle: SimulatedHandle, mut config: Value) -> SdkFactory {
    config["mode"] = json!("manual");
    Arc::new(move || {
        let mut sdk = SimulatedSdk::with_handle(handle.clone());
        sdk.configure(&config)?;
        Ok(Box::new(sdk) as Box<dyn SdkClient>)
    })
}

/// Frame `n` with rigid body 1 and a four-bone skeleton 1, all moving
pub fn raw_frame(n: i32) -> RawFrame {
    let t = n as f64 * 0.01;
    let half = (n as f32 * 3.0).to_radians() / 2.0;

    let bones = (1..=4)
        .map(|bone| {
            let bend = half * bone as f32 * 0.5;
            RawRigidBody::new(
                bone,
                [0.01 * n as f32 + 0.05 * bone as f32, 0.3 * bone as f32, 0.0],
                [bend.sin(), 0.0, 0.0, bend.cos()],
            )
        })
        .collect();

    RawFrame {
        frame_number: n,
        timestamp: t,
        rigid_bodies: vec![RawRigidBody::new(
            1,
            [0.02 * n as f32 * n as f32, 1.0, 0.5],
            [0.0, half.sin(), 0.0, half.cos()],
        )],
        skeletons: vec![RawSkeleton { id: 1, bones }],
    }
}
