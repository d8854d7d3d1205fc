//! Driftmix - ambient sound mixer
//!
//! Entry point and command loop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use driftmix_app::{AppConfig, Cli, Command, Flow, LogNotifier, Session};
use driftmix_audio::{
    AppPhase, AudioBackend, DeviceBackend, LifecycleCoordinator, MixEngine, SimulatedBackend,
};
use driftmix_core::SoundCatalog;
use driftmix_store::MixStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse(std::env::args().skip(1))?;
    let config_path: PathBuf = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path().context("No config directory on this platform")?,
    };
    let mut config = AppConfig::load_or_init(&config_path)?;
    cli.apply(&mut config);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(config = %config_path.display(), "Driftmix starting...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("driftmix-worker")
        .build()?;
    runtime.block_on(run(config))
}

fn open_backend(config: &AppConfig) -> Arc<dyn AudioBackend> {
    if config.headless {
        info!("Using simulated audio backend");
        return Arc::new(SimulatedBackend::new());
    }
    match DeviceBackend::open() {
        Ok(device) => Arc::new(device),
        Err(error) => {
            warn!(%error, "No audio output, falling back to simulated backend");
            Arc::new(SimulatedBackend::new())
        }
    }
}

async fn run(config: AppConfig) -> Result<()> {
    let catalog = Arc::new(SoundCatalog::builtin().with_root(&config.sounds_dir));
    let store = MixStore::open(&config.store_path).await?;
    let engine = MixEngine::new(open_backend(&config), catalog, config.engine_config())?;

    let (phase, phases) = watch::channel(AppPhase::Foreground);
    let lifecycle = LifecycleCoordinator::spawn(
        &engine,
        phases,
        Arc::new(LogNotifier::new()),
        config.notification_title.clone(),
    );
    let session = Session::new(engine, store, phase);

    println!("driftmix ready, type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                println!("{}", error);
                continue;
            }
        };
        match session.execute(command).await {
            Ok(Flow::Continue(reply)) => println!("{}", reply),
            Ok(Flow::Quit) => break,
            Err(error) => println!("error: {}", error),
        }
    }

    session.teardown().await;
    lifecycle.shutdown().await;
    info!("Driftmix stopped");
    Ok(())
}
