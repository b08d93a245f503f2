//! Navigation data builder binary: voxelizes a JSON scene into cached
//! navigation data and optionally runs a path query against it.
//!
//! Usage: cargo run --release --bin build_navdata -- --scene <FILE> [OPTIONS]
//!
//! Options:
//!   --scene <FILE>     Scene description (required)
//!   --cache <DIR>      Cache directory (default: "navcache")
//!   --from <X,Y,Z>     Query start point
//!   --to <X,Y,Z>       Query goal point
//!   --diagonals        Allow 26-connected moves
//!   --theta            Use any-angle (Theta*) search
//!   --lazy-theta       Use Lazy Theta* (fewer line-of-sight checks)
//!   --subdivisions <N> Curve points between smoothed waypoints
//!   --no-smooth        Keep the raw cell-center path
//!   --debug-out <FILE> Write blocked cells and the path as JSON
//!
//! Scene format:
//!   {
//!     "config": { "origin": [0, 0, 0], "half_extent": 32, "voxel_size": 1, "max_depth": 4 },
//!     "obstacles": [
//!       { "type": "box", "min": [-4, -4, -4], "max": [4, 4, 4] },
//!       { "type": "sphere", "center": [10, 0, 0], "radius": 3 }
//!     ]
//!   }

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use serde::Deserialize;
use serde_json::json;

use svonav::cache::NavDataCache;
use svonav::nav::{NavQuery, PathOptions, PathRequest, SearchAlgorithm};
use svonav::svo::{BuildConfig, CellState, DebugCell, DebugDrawSink, Obstacle, ObstacleOracle};
use svonav::{Error, Result};

#[derive(Deserialize)]
struct SceneFile {
    config: BuildConfig,
    #[serde(default)]
    obstacles: Vec<Obstacle>,
}

#[derive(Default)]
struct JsonSink {
    cells: Vec<serde_json::Value>,
    segments: Vec<serde_json::Value>,
}

impl DebugDrawSink for JsonSink {
    fn draw_cell(&mut self, cell: &DebugCell) {
        self.cells.push(json!({
            "address": cell.address.to_string(),
            "min": cell.aabb.min.to_array(),
            "max": cell.aabb.max.to_array(),
            "blocked": cell.state == CellState::Blocked,
        }));
    }

    fn draw_segment(&mut self, from: Vec3, to: Vec3) {
        self.segments.push(json!({ "from": from.to_array(), "to": to.to_array() }));
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<()> {
    let scene_path = parse_str_arg(args, "--scene")
        .ok_or_else(|| Error::InvalidConfig("--scene <FILE> is required".into()))?;
    let cache_dir = PathBuf::from(parse_str_arg(args, "--cache").unwrap_or_else(|| "navcache".to_string()));

    let text = tokio::fs::read_to_string(&scene_path).await?;
    let scene: SceneFile = serde_json::from_str(&text)
        .map_err(|e| Error::InvalidConfig(format!("{}: {}", scene_path, e)))?;

    println!("=== Svonav Navigation Builder ===");
    println!("Scene:     {}", scene_path);
    println!("Obstacles: {}", scene.obstacles.len());
    println!("Volume:    {:?} +/- {}", scene.config.origin, scene.config.half_extent);
    println!("Voxel:     {} (max depth {})", scene.config.voxel_size, scene.config.max_depth);
    println!("Cache:     {}", cache_dir.display());
    println!();

    let oracle = Arc::new(ObstacleOracle::from_obstacles(scene.obstacles));
    let mut cache = NavDataCache::with_dir(1, &cache_dir);

    let start = Instant::now();
    let (data, source) = cache.load_or_build(scene.config, oracle.as_ref()).await?;
    println!("Navigation data ({:?}) ready in {:.1}ms", source, start.elapsed().as_secs_f64() * 1000.0);
    println!("{}", data.stats());
    println!("Memory: {:.1} KB", data.memory_usage() as f64 / 1024.0);

    let mut sink = JsonSink::default();
    data.draw(&mut sink, true);

    let from = parse_vec3_arg(args, "--from");
    let to = parse_vec3_arg(args, "--to");
    if let (Some(from), Some(to)) = (from, to) {
        let algorithm = if has_flag(args, "--lazy-theta") {
            SearchAlgorithm::LazyThetaStar
        } else if has_flag(args, "--theta") {
            SearchAlgorithm::ThetaStar
        } else {
            SearchAlgorithm::AStar
        };
        let smoothing_subdivisions = match parse_str_arg(args, "--subdivisions") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("--subdivisions expects a count, got {}", raw)))?,
            None => 0,
        };
        let options = PathOptions {
            use_diagonals: has_flag(args, "--diagonals"),
            algorithm,
            smooth: !has_flag(args, "--no-smooth"),
            smoothing_subdivisions,
            ..PathOptions::default()
        };
        let query = NavQuery::new(Arc::clone(&data), oracle);

        let start = Instant::now();
        let path = query.find_path(&PathRequest::new(from, to).with_options(options))?;
        println!();
        println!(
            "Path: {} waypoints, length {:.2}, {} expanded, {} sight checks, {:.2}ms",
            path.len(),
            path.length(),
            path.stats.expanded,
            path.stats.line_of_sight_checks,
            start.elapsed().as_secs_f64() * 1000.0
        );
        for (i, point) in path.waypoints.iter().enumerate() {
            println!("  {:3}: ({:.2}, {:.2}, {:.2})", i, point.x, point.y, point.z);
        }
        path.draw(&mut sink);
    } else if from.is_some() || to.is_some() {
        return Err(Error::InvalidConfig("--from and --to must be given together".into()));
    }

    if let Some(out) = parse_str_arg(args, "--debug-out") {
        let debug = json!({ "cells": sink.cells, "segments": sink.segments });
        let text = serde_json::to_string_pretty(&debug)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        tokio::fs::write(&out, text).await?;
        println!("Debug geometry written to {}", out);
    }

    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_vec3_arg(args: &[String], flag: &str) -> Option<Vec3> {
    let raw = parse_str_arg(args, flag)?;
    let parts: Vec<f32> = raw.split(',').map(|s| s.trim().parse().ok()).collect::<Option<_>>()?;
    match parts.as_slice() {
        [x, y, z] => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}
