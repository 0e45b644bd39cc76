use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::time::Duration;
use mocaplab::assets::AssetResolver;
use mocaplab::config::{AppConfigManager, SportCatalog};
use mocaplab::engine::{DataProcessor, KernelOutput, StreamingKernel};
use mocaplab::hal::SourceRegistry;
use mocaplab::observability::StreamMonitor;
use mocaplab::storage::TakeStorage;

#[derive(Parser, Debug)]
#[command(author, version, about = "Motion capture metrics: live streaming, recording and replay", long_about = None)]
struct Args {
    /// Application config file, created with defaults when missing
    #[arg(short, long, default_value = "mocaplab.json")]
    config: PathBuf,

    /// Replay this take (file name in the take directory, or a path) instead of connecting
    #[arg(short, long)]
    take: Option<PathBuf>,

    /// Replay speed in percent
    #[arg(short, long, default_value_t = 100.0)]
    speed: f64,

    /// Stop a live session after this many metric outputs
    #[arg(short, long, default_value_t = 300)]
    frames: usize,

    /// Record the session (live or replayed) to a new take
    #[arg(short, long, default_value_t = false)]
    record: bool,

    /// Sport from the catalog, overrides the config
    #[arg(long)]
    sport: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mocaplab=info".parse()?),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let manager = AppConfigManager::new(args.config.clone());
    let config = manager.load().await?;

    let catalog = match SportCatalog::load(manager.resolve_path(&config.sports_config)) {
        Ok(catalog) => catalog,
        Err(e) => {
            log::warn!("No sports catalog: {:#}", e);
            SportCatalog::default()
        }
    };

    let mut registry = SourceRegistry::with_builtin();
    if config.source == "simulated" {
        registry.register_simulated("simulated", config.source_config.clone());
    }
    let factory = registry.factory(&config.source)?;

    let resolver = AssetResolver::with_joint_config(manager.resolve_path(&config.joint_config));
    let storage = TakeStorage::new(manager.resolve_path(&config.take_dir))?;
    let mut kernel = StreamingKernel::new(
        factory,
        DataProcessor::new(resolver),
        storage,
        Duration::from_millis(config.replay_base_interval_ms),
    );

    if let Some(name) = args.sport.as_ref().or(config.sport.as_ref()) {
        let sport = catalog
            .sport(name)
            .with_context(|| format!("Unknown sport '{}', known: {:?}", name, catalog.names()))?;
        kernel.set_sport(sport.metrics());
    }
    kernel.processor_mut().select_rigid_body(config.rigid_body.as_deref());
    kernel.processor_mut().select_skeleton(config.skeleton.as_deref());

    let live = args.take.is_none();
    if let Some(take) = &args.take {
        if !kernel.load_take(take) {
            bail!("Could not load take {:?}", take);
        }
    } else if !kernel.connect(&config.connection).await {
        bail!("Could not connect to {}", config.connection.server_address);
    }

    if args.record {
        kernel.start_recording()?;
    }
    if !live && !kernel.start_replay(args.speed) {
        bail!("Replay did not start");
    }

    let mut outputs = 0usize;
    loop {
        let output = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
            output = kernel.next_output() => output,
        };
        let Some(output) = output else { break };

        match output {
            KernelOutput::Metrics(metrics) => {
                log::info!(
                    "frame {}: rigid body {:?} skeleton {:?}",
                    metrics.frame_number,
                    metrics.rigid_body.metrics,
                    metrics.skeleton.metrics
                );
                outputs += 1;
                if live && outputs >= args.frames {
                    break;
                }
            }
            KernelOutput::AssetsUpdated { rigid_bodies, skeletons, .. } => {
                log::info!("Assets: rigid bodies {:?}, skeletons {:?}", rigid_bodies, skeletons);
                let processor = kernel.processor_mut();
                if config.rigid_body.is_none() {
                    processor.select_rigid_body(rigid_bodies.first().map(String::as_str));
                }
                if config.skeleton.is_none() {
                    processor.select_skeleton(skeletons.first().map(String::as_str));
                }
            }
            KernelOutput::ConnectionChanged(connected) => {
                log::info!("Connected: {}", connected);
                if !connected {
                    break;
                }
            }
            KernelOutput::ReplayFinished => break,
            KernelOutput::TakeSaved(path) => log::info!("New take {:?}", path),
        }
    }

    kernel.stop_replay();
    if kernel.recorder().is_recording() {
        let path = kernel.stop_recording()?;
        log::info!("Saved take {:?}", path);
    }
    if live {
        kernel.disconnect().await;
    }

    println!("{}", StreamMonitor::new(kernel.collector().clone()).generate_report());
    Ok(())
}
