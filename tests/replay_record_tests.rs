mod common;

use anyhow::Result;
use chrono::{Local, TimeZone};
use common::{manual_factory, raw_frame};
use mocaplab::assets::AssetResolver;
use mocaplab::config::{ConnectionSettings, SportMetrics};
use mocaplab::core::{AssetSnapshot, FrameData};
use mocaplab::engine::{DataProcessor, FrameMetrics, KernelOutput, StreamingKernel};
use mocaplab::hal::mock::SimulatedHandle;
use mocaplab::hal::RawFrame;
use mocaplab::metrics::MetricDefinition;
use mocaplab::storage::{Take, TakeStorage};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use tokio::time::{timeout, Duration, Instant};

fn sport() -> SportMetrics {
    let decode = |value| MetricDefinition::from_json(&value).unwrap();
    SportMetrics {
        rigid: vec![
            decode(json!({"class": "tilt", "labels": ["tilt"]})),
            decode(json!({"class": "velocity", "labels": ["speed"]})),
            decode(json!({"class": "acceleration", "labels": ["accel"]})),
            decode(json!({"class": "position", "labels": ["x", "y", "z"]})),
        ],
        body: vec![
            decode(json!({"class": "angle", "ids": [0, 1], "labels": ["hipSpine"]})),
            decode(json!({"class": "distance", "ids": [0, 3], "labels": ["reach"]})),
        ],
    }
}

fn kernel(storage_dir: &Path, handle: SimulatedHandle, base_interval: Duration) -> StreamingKernel {
    let storage = TakeStorage::new(storage_dir.to_path_buf()).unwrap();
    let mut kernel = StreamingKernel::new(
        manual_factory(handle),
        DataProcessor::new(AssetResolver::new()),
        storage,
        base_interval,
    );
    kernel.set_sport(sport());
    kernel
}

async fn next(kernel: &mut StreamingKernel) -> KernelOutput {
    timeout(Duration::from_secs(5), kernel.next_output())
        .await
        .expect("timed out waiting for kernel output")
        .expect("kernel event channel closed")
}

/// Collect metrics until replay completes
async fn replayed_metrics(kernel: &mut StreamingKernel) -> Vec<FrameMetrics> {
    let mut metrics = Vec::new();
    loop {
        match next(kernel).await {
            KernelOutput::Metrics(m) => metrics.push(m),
            KernelOutput::ReplayFinished => return metrics,
            _ => {}
        }
    }
}

fn take_with(frames: Vec<FrameData>) -> Take {
    let mut assets = AssetSnapshot::default();
    assets.maps.rigid_bodies = BTreeMap::from([(1, "Bat".to_string())]);
    Take::new(assets, frames)
}

fn stored_take(storage_dir: &Path, frames: usize) -> PathBuf {
    let frames = (1..=frames as i32)
        .map(|n| FrameData::from(&raw_frame(n)))
        .collect();
    let storage = TakeStorage::new(storage_dir.to_path_buf()).unwrap();
    let time = Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    storage.save_at(&take_with(frames), time).unwrap()
}

#[tokio::test]
async fn test_recorded_take_replays_to_identical_metrics() -> Result<()> {
    let dir = tempdir()?;
    let handle = SimulatedHandle::new();
    let mut kernel = kernel(dir.path(), handle.clone(), Duration::from_millis(1));

    assert!(kernel.connect(&ConnectionSettings::default()).await);
    match next(&mut kernel).await {
        KernelOutput::AssetsUpdated { rigid_bodies, skeletons, .. } => {
            assert_eq!(rigid_bodies, vec!["SimBody".to_string()]);
            assert_eq!(skeletons, vec!["SimSkeleton".to_string()]);
        }
        other => panic!("expected assets, got {:?}", other),
    }
    assert_eq!(next(&mut kernel).await, KernelOutput::ConnectionChanged(true));

    assert_eq!(kernel.processor_mut().select_rigid_body(Some("SimBody")), Some(1));
    assert_eq!(kernel.processor_mut().select_skeleton(Some("SimSkeleton")), Some(1));
    kernel.start_recording()?;

    let raw: Vec<RawFrame> = (1..=12).map(raw_frame).collect();
    for frame in &raw {
        handle.push(frame.clone())?;
    }
    // A repeated frame is dropped at ingest and never reaches the take
    handle.push(raw[11].clone())?;

    let mut live = Vec::new();
    while live.len() < raw.len() - 2 {
        if let KernelOutput::Metrics(m) = next(&mut kernel).await {
            live.push(m);
        }
    }
    assert_eq!(live.first().map(|m| m.frame_number), Some(3));
    assert!(live.iter().all(|m| m.rigid_body.len() == 6 && m.skeleton.len() == 2));

    let path = kernel.stop_recording()?;
    assert_eq!(next(&mut kernel).await, KernelOutput::TakeSaved(path.clone()));

    let saved = kernel.storage().load(&path)?;
    assert_eq!(saved.len(), raw.len());
    assert_eq!(saved.rigid_bodies.get(&1).map(String::as_str), Some("SimBody"));
    assert_eq!(saved.gl_assets.skeletons.len(), 1);

    kernel.disconnect().await;
    assert!(!kernel.is_connected());

    let file_name = path.file_name().unwrap().to_owned();
    assert!(kernel.load_take(&file_name));
    assert!(matches!(next(&mut kernel).await, KernelOutput::AssetsUpdated { .. }));
    assert_eq!(kernel.processor().selected_rigid_body(), Some(1));

    assert!(kernel.start_replay(100.0));
    let replayed = replayed_metrics(&mut kernel).await;

    assert_eq!(replayed, live);
    assert!(!kernel.replay().is_replaying());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_half_speed_takes_twice_as_long() {
    let dir = tempdir().unwrap();
    stored_take(dir.path(), 20);
    let mut kernel = kernel(dir.path(), SimulatedHandle::new(), Duration::from_millis(10));

    let name = kernel.storage().list_all().unwrap().remove(0);
    let mut elapsed = Vec::new();
    for speed in [100.0, 50.0] {
        assert!(kernel.load_take(&name));
        let start = Instant::now();
        assert!(kernel.start_replay(speed));
        let metrics = replayed_metrics(&mut kernel).await;
        elapsed.push(start.elapsed());
        assert_eq!(metrics.len(), 18);
    }

    assert!(elapsed[0] >= Duration::from_millis(190));
    let ratio = elapsed[1].as_secs_f64() / elapsed[0].as_secs_f64();
    assert!((ratio - 2.0).abs() < 0.1, "ratio was {}", ratio);
}

#[tokio::test(start_paused = true)]
async fn test_restart_ignores_stale_finish() {
    let dir = tempdir().unwrap();
    let path = stored_take(dir.path(), 50);
    let mut kernel = kernel(dir.path(), SimulatedHandle::new(), Duration::from_millis(10));

    assert!(kernel.load_take(&path));
    assert!(kernel.start_replay(100.0));
    assert!(!kernel.start_replay(100.0));
    kernel.stop_replay();
    assert!(!kernel.replay().is_replaying());

    assert!(kernel.start_replay(200.0));
    let metrics = replayed_metrics(&mut kernel).await;
    assert!(!metrics.is_empty());
    assert_eq!(metrics.last().map(|m| m.frame_number), Some(50));
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_queued_replay_frames() -> Result<()> {
    let dir = tempdir()?;
    let path = stored_take(dir.path(), 50);
    let mut kernel = kernel(dir.path(), SimulatedHandle::new(), Duration::from_millis(10));

    assert!(kernel.load_take(&path));
    next(&mut kernel).await;
    kernel.start_recording()?;
    assert!(kernel.start_replay(100.0));

    // Four ticks fire while nothing is consumed
    tokio::time::sleep(Duration::from_millis(35)).await;
    kernel.stop_replay();
    tokio::time::sleep(Duration::from_secs(1)).await;

    while let Some(output) = kernel.try_next_output() {
        assert!(
            !matches!(output, KernelOutput::Metrics(_) | KernelOutput::ReplayFinished),
            "output after stop: {:?}",
            output
        );
    }
    assert_eq!(kernel.recorder().frame_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_restart_with_queued_frames_matches_clean_run() {
    let dir = tempdir().unwrap();
    let path = stored_take(dir.path(), 50);
    let mut kernel = kernel(dir.path(), SimulatedHandle::new(), Duration::from_millis(10));
    kernel.processor_mut().select_rigid_body(Some("Bat"));

    assert!(kernel.load_take(&path));
    next(&mut kernel).await;
    assert!(kernel.start_replay(100.0));
    let clean = replayed_metrics(&mut kernel).await;

    assert!(kernel.start_replay(100.0));
    tokio::time::sleep(Duration::from_millis(35)).await;
    kernel.stop_replay();
    assert!(kernel.start_replay(100.0));
    let restarted = replayed_metrics(&mut kernel).await;

    let numbers: Vec<i32> = restarted.iter().map(|m| m.frame_number).collect();
    assert_eq!(numbers, (3..=50).collect::<Vec<_>>());
    assert_eq!(restarted, clean);
    assert!(restarted.iter().all(|m| m.rigid_body.get("speed").is_some()));
}

#[tokio::test]
async fn test_disconnect_discards_queued_live_frames() -> Result<()> {
    let dir = tempdir()?;
    let handle = SimulatedHandle::new();
    let mut kernel = kernel(dir.path(), handle.clone(), Duration::from_millis(1));

    assert!(kernel.connect(&ConnectionSettings::default()).await);
    assert!(matches!(next(&mut kernel).await, KernelOutput::AssetsUpdated { .. }));
    assert_eq!(next(&mut kernel).await, KernelOutput::ConnectionChanged(true));

    for n in 1..=5 {
        handle.push(raw_frame(n))?;
    }
    timeout(Duration::from_secs(2), async {
        while kernel.frame_buffer().len() < 5 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    kernel.disconnect().await;

    let mut outputs = Vec::new();
    while let Some(output) = kernel.try_next_output() {
        outputs.push(output);
    }
    assert_eq!(outputs, vec![KernelOutput::ConnectionChanged(false)]);
    Ok(())
}

#[tokio::test]
async fn test_malformed_take_leaves_state_untouched() {
    let dir = tempdir().unwrap();
    let good = stored_take(dir.path(), 5);
    fs::write(dir.path().join("broken.json"), r#"{ "frames": [ { "frameNumber": "#).unwrap();
    let mut kernel = kernel(dir.path(), SimulatedHandle::new(), Duration::from_millis(1));

    assert!(kernel.load_take(&good));
    assert!(matches!(next(&mut kernel).await, KernelOutput::AssetsUpdated { .. }));
    assert_eq!(kernel.processor_mut().select_rigid_body(Some("Bat")), Some(1));

    assert!(!kernel.load_take("broken.json"));
    assert!(!kernel.load_take("missing.json"));

    assert_eq!(kernel.replay().take().map(Take::len), Some(5));
    assert_eq!(kernel.processor().selected_rigid_body(), Some(1));
    assert!(kernel.try_next_output().is_none());
}

#[tokio::test]
async fn test_empty_take_does_not_replay() {
    let dir = tempdir().unwrap();
    let storage = TakeStorage::new(dir.path().to_path_buf()).unwrap();
    let path = storage.save(&take_with(Vec::new())).unwrap();
    let mut kernel = kernel(dir.path(), SimulatedHandle::new(), Duration::from_millis(1));

    assert!(!kernel.start_replay(100.0));
    assert!(kernel.load_take(&path));
    assert!(!kernel.start_replay(100.0));
    assert!(!kernel.replay().is_replaying());
}

#[tokio::test(start_paused = true)]
async fn test_recording_a_replay_copies_the_take() -> Result<()> {
    let dir = tempdir()?;
    let source = stored_take(dir.path(), 8);
    let mut kernel = kernel(dir.path(), SimulatedHandle::new(), Duration::from_millis(5));

    assert!(kernel.load_take(&source));
    next(&mut kernel).await;
    kernel.start_recording()?;
    assert!(kernel.start_recording().is_err());

    assert!(kernel.start_replay(100.0));
    replayed_metrics(&mut kernel).await;
    let copy = kernel.stop_recording()?;
    assert!(kernel.stop_recording().is_err());

    let original = kernel.storage().load(&source)?;
    let recorded = kernel.storage().load(&copy)?;
    assert_ne!(source, copy);
    assert_eq!(recorded.frames, original.frames);
    assert_eq!(recorded.rigid_bodies, original.rigid_bodies);
    Ok(())
}
