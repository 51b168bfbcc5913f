//! Corridor - headless streaming runner
//!
//! Autoplays through a segment corridor at a fixed tick, streaming payloads
//! from disk and logging what a renderer would be told.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --config <FILE>      Streaming config JSON (default: built-in defaults)
//!   --manifest <FILE>    Segment manifest (default: <payload_dir>/segments.json)
//!   --seconds <SECS>     How long to travel (default: 30)
//!   --speed <M/S>        Autoplay speed (default: 20)
//!   --no-loop            Stop at the corridor end instead of wrapping

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use corridor::core::{logging, Result};
use corridor::scene::SceneManager;
use corridor::segment::SegmentTable;
use corridor::streaming::{FileSource, StreamEvent, Streamer, StreamingConfig};
use corridor::travel::{Travel, TravelConfig};

/// Simulation tick
const TICK: Duration = Duration::from_micros(16_667);

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let config = match parse_str_arg(&args, "--config") {
        Some(path) => {
            log::info!("Loading streaming config from {}", path);
            StreamingConfig::load(&PathBuf::from(path))?
        }
        None => StreamingConfig::default(),
    };

    let manifest = parse_str_arg(&args, "--manifest")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.payload_dir.join("segments.json"));
    let seconds = parse_f32_arg(&args, "--seconds").unwrap_or(30.0).max(0.0);

    let speed = parse_f32_arg(&args, "--speed");
    let mut travel_config = TravelConfig::default();
    if args.iter().any(|a| a == "--no-loop") {
        travel_config.looping = false;
    }

    let table = match SegmentTable::load(&manifest).await {
        Ok(table) => Arc::new(table),
        Err(e) => {
            log::error!("Could not read manifest {}", manifest.display());
            log::error!("Generate one with: cargo run --release --bin generate_splats");
            return Err(e);
        }
    };

    log::info!(
        "Corridor: {} segments, {:.1}m total, preload {}m, unload threshold {}",
        table.len(),
        table.total_length(),
        config.preload_distance,
        config.unload_threshold
    );

    let source = Arc::new(FileSource::new(config.payload_dir.clone()));
    let sink = SceneManager::new().with_placeholders(true);
    let mut streamer = Streamer::new(Arc::clone(&table), source, sink, &config)?;
    let mut travel = Travel::new(&table, travel_config);
    if let Some(speed) = speed {
        travel.set_speed(speed);
    }
    travel.play();

    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let dt = TICK.as_secs_f32();
    let ticks = (seconds / dt).ceil() as u64;
    let start = Instant::now();
    let mut last_report = Instant::now();

    streamer.handle(StreamEvent::Position(travel.position()));

    for _ in 0..ticks {
        ticker.tick().await;

        let position = travel.advance(dt);
        streamer.handle(StreamEvent::Position(position));
        streamer.pump();

        if last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();
            let scene = streamer.sink();
            log::info!(
                "z={:.1}m ({:.0}%) active={} resident={} splats={} loading={}",
                position,
                travel.progress() * 100.0,
                streamer.active().map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
                scene.len(),
                scene.resident_splats(),
                streamer.pipeline().in_flight()
            );
        }

        if !travel.is_playing() {
            log::info!("Reached corridor end");
            break;
        }
    }

    streamer.settle().await;

    let stats = streamer.stats();
    log::info!("=== Streaming Summary ===");
    log::info!("Elapsed:        {:.2}s", start.elapsed().as_secs_f64());
    log::info!("Positions:      {} ({} off track)", stats.positions, stats.off_track);
    log::info!("Switches:       {}", stats.switches);
    log::info!("Requested:      {}", stats.pipeline.requested);
    log::info!("Loaded:         {}", stats.pipeline.loaded);
    log::info!("Failed:         {}", stats.pipeline.failed);
    log::info!("Evicted:        {}", stats.pipeline.evicted);
    log::info!("Stale dropped:  {}", stats.pipeline.stale_discarded);
    log::info!(
        "Resident:       {} segments, {} splats, {:.2} MB decoded",
        streamer.sink().len(),
        streamer.sink().resident_splats(),
        streamer.pipeline().payload_bytes() as f64 / (1024.0 * 1024.0)
    );

    Ok(())
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
