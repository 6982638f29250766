mod api;
mod ports;
mod runtime;
mod value_noise;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use audio::AudioMix;
use audio::engine::AudioEngine;
use axum::serve;
use snowfield_core::director::SceneDirector;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::interval;
use tracing::{info, warn};

use crate::ports::{BroadcastCaptions, MixAudioPort};
use crate::value_noise::ValueNoise;

#[derive(Debug)]
struct Config {
    tick_hz: f64,
    port: u16,
    audio_dir: PathBuf,
    start_muted: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            port: 3000,
            audio_dir: PathBuf::from("assets/audio"),
            start_muted: true,
        }
    }
}

impl Config {
    fn from_env() -> Self {
        let tick_hz = std::env::var("TICK_HZ")
            .unwrap_or_else(|_| "60.0".to_string())
            .parse()
            .unwrap_or(60.0);
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let audio_dir = std::env::var("AUDIO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("assets/audio"));
        // Audio stays muted until the user opts in.
        let start_muted = std::env::var("START_MUTED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        Self {
            tick_hz,
            port,
            audio_dir,
            start_muted,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Setup tracing with timestamped logs
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("Starting...");

    let config = Config::from_env();

    // Load the sound set best-effort before sharing the mix across tasks.
    let mut audio_mix = AudioMix::new(config.start_muted);
    audio_mix.load_all(&config.audio_dir);
    let audio = Arc::new(audio_mix);

    // Start the output engine early (with error handling). The stream must
    // stay on this thread, so the engine lives here for the process lifetime.
    let audio_engine_result = AudioEngine::start(Arc::clone(&audio));
    let _audio_engine = match audio_engine_result {
        Ok(engine) => {
            info!("Audio engine started successfully");
            Some(engine)
        }
        Err(e) => {
            warn!(
                "Audio engine failed to start ({}), continuing without audio output",
                e
            );
            None
        }
    };

    let tick_hz = config.tick_hz;
    info!("Tick rate: {:.0} Hz", tick_hz);

    // Create channels
    let (control_tx, control_rx) = mpsc::channel(100);
    let (caption_tx, _) = broadcast::channel(32);

    let director = SceneDirector::new(
        Box::new(MixAudioPort::new(Arc::clone(&audio))),
        Box::new(BroadcastCaptions::new(caption_tx.clone())),
        Box::new(ValueNoise::new(0x736e_6f77)),
    );
    let (state_tx, state_rx) = watch::channel(director.snapshot());

    // Spawn tasks
    tokio::spawn(runtime::start_world_task(director, control_rx, state_tx));
    tokio::spawn(runtime::start_tick_task(control_tx.clone(), tick_hz));

    // State logger task: log a snapshot line every 5 seconds
    let state_rx_clone = state_rx.clone();
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            let borrowed = state_rx_clone.borrow();
            info!(
                "State: mode={:?}, elapsed={:.1}s, scroll={:.0}/{:.0}, wind={:.2}, snow={:.2}",
                borrowed.mode,
                borrowed.journey.elapsed_time,
                borrowed.journey.scroll_distance,
                borrowed.journey.target_distance,
                borrowed.wind.amplitude,
                borrowed.snow_density
            );
        }
    });

    // Start API server
    let app = api::create_router(control_tx, state_rx, caption_tx, audio);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("API server listening on http://localhost:{}", config.port);
    tokio::spawn(async move {
        serve(listener, app).await.unwrap();
    });

    // Keep the main task alive
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    Ok(())
}
