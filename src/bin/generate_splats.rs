//! Splat data generator - writes synthetic segment payloads to disk.
//!
//! Usage: cargo run --release --bin generate_splats -- [OPTIONS]
//!
//! Options:
//!   --out <DIR>          Output directory (default: "assets/splats")
//!   --segments <N>       Number of segments (default: 5)
//!   --length <METERS>    Segment length in meters (default: 100)
//!   --seed <SEED>        Random seed (default: 12345)
//!   --jobs <N>           Max parallel segment builds (default: 4)
//!
//! Output structure:
//!   <out>/
//!     segments.json        # Segment table manifest
//!     segment_0.splat
//!     segment_1.splat
//!     ...

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;

use corridor::codec::{corridor_table, default_splat_count, encode, synthesize_segment};
use corridor::core::{Error, Result};

fn main() {
    corridor::core::logging::init();

    if let Err(e) = run() {
        log::error!("Generation failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let output_dir = parse_str_arg(&args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets/splats"));
    let segment_count = parse_u32_arg(&args, "--segments").unwrap_or(5);
    let length = parse_f32_arg(&args, "--length").unwrap_or(100.0);
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let jobs = parse_usize_arg(&args, "--jobs").unwrap_or(4);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| Error::Runtime(e.to_string()))?;

    println!("=== Corridor Splat Generator ===");
    println!("Segments: {} x {}m", segment_count, length);
    println!("Seed:     {}", seed);
    println!("Output:   {}", output_dir.display());
    println!();

    let table = corridor_table(segment_count, length)?;
    std::fs::create_dir_all(&output_dir)?;

    let start = Instant::now();
    let segments: Vec<_> = table.iter().cloned().collect();

    let written: Vec<(String, usize, usize)> = pool.install(|| {
        segments
            .par_iter()
            .map(|segment| -> Result<(String, usize, usize)> {
                let count = default_splat_count(segment.id.index());
                let records = synthesize_segment(segment.id, count, length, seed);
                let bytes = encode(&records);

                std::fs::write(output_dir.join(&segment.file), &bytes)?;
                Ok((segment.file.clone(), count, bytes.len()))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    for (file, count, bytes) in &written {
        println!("  {} ({} splats, {:.2} KB)", file, count, *bytes as f64 / 1024.0);
    }

    let manifest_path = output_dir.join("segments.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&table.to_manifest())?)?;

    println!();
    println!("=== Generation Complete ===");
    println!("Wrote {} segments in {:.2}s", written.len(), start.elapsed().as_secs_f64());
    println!("Manifest: {}", manifest_path.display());
    println!();
    println!("To stream this corridor:");
    println!("  cargo run --release -- --manifest {}", manifest_path.display());

    Ok(())
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
