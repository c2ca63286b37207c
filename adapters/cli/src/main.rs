#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Prefire experiment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use prefire_audio::{AudioOutput, VirtualAudioOutput};
use prefire_cli::{AppConfig, Simulation};
use prefire_persistence::{BestStatsRecorder, JsonFileStore, MemoryStore, PersistenceGateway};
use prefire_rendering::{Color, KeyLayout, Presentation, RenderingBackend, Scene};
use prefire_rendering_macroquad::MacroquadBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-cued anticipation experiment")]
struct Args {
    /// Identifier the best statistics are stored under.
    #[arg(long, default_value = "anonymous")]
    user: String,

    /// Use the right-hand quarter keys (P [ ] \) instead of 1-4.
    #[arg(long)]
    right_handed: bool,

    /// Path to the configuration TOML.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file holding best statistics; kept in memory when omitted.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Directory containing the piano samples.
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Seed overriding the configured random sources.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the mixed session audio to a WAV file.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Play through the default sound card.
    #[cfg(feature = "device")]
    #[arg(long)]
    device: bool,
}

#[cfg(feature = "device")]
fn open_device(args: &Args) -> Result<Option<Box<dyn AudioOutput>>> {
    if !args.device {
        return Ok(None);
    }
    let output = prefire_audio::CpalAudioOutput::open(args.audio_dir.clone())
        .context("failed to open the audio device")?;
    Ok(Some(Box::new(output)))
}

#[cfg(not(feature = "device"))]
fn open_device(_args: &Args) -> Result<Option<Box<dyn AudioOutput>>> {
    Ok(None)
}

fn open_audio(args: &Args) -> Result<Box<dyn AudioOutput>> {
    if let Some(device) = open_device(args)? {
        return Ok(device);
    }

    let output = VirtualAudioOutput::new(args.audio_dir.clone());
    let output = match &args.record {
        Some(path) => output
            .capture_to(path)
            .with_context(|| format!("failed to record to {}", path.display()))?,
        None => output,
    };
    Ok(Box::new(output))
}

fn open_store(args: &Args) -> Box<dyn PersistenceGateway> {
    match &args.store {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    }
}

/// Entry point for the Prefire command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())
        .context("failed to load config")?;
    if let Some(seed) = args.seed {
        config.override_seed(seed);
    }

    let layout = if args.right_handed {
        KeyLayout::RightHanded
    } else {
        KeyLayout::LeftHanded
    };
    let audio = open_audio(&args)?;
    let recorder = BestStatsRecorder::new(open_store(&args), args.user.clone());
    let mut simulation = Simulation::new(
        config.world_config(),
        config.sequencer_config(),
        audio,
        recorder,
        layout,
    );
    info!(user = %args.user, ?layout, "prefire ready");

    let presentation = Presentation::new(
        config.window.title.clone(),
        Color::WHITE,
        Scene::new(simulation.overlay().clone()),
    );
    MacroquadBackend::new()
        .with_vsync(config.window.vsync)
        .with_window_size(config.window.width, config.window.height)
        .run(presentation, move |dt, input, scene| {
            let control = simulation.step(dt, &input);
            scene.overlay = simulation.overlay().clone();
            control
        })
}
