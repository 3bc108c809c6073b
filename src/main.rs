//! Navtri - headless navmesh build demo
//!
//! Generates a noise terrain with a few obstacles, walks an observer across
//! it while the pipeline builds, then runs a path query. With
//! `--debug-port` the session stays up for inspection over TCP.

use std::sync::Arc;
use std::time::Duration;

use navtri::core::logging;
use navtri::core::types::{Quat, Vec3};
use navtri::navmesh::NavConfig;
use navtri::path::AgentParams;
use navtri::scene::{StaticScene, TerrainGenerator, TerrainParams};
use navtri::session::NavSession;

/// Observer speed along +X, in meters per tick
const WALK_STEP: f32 = 0.05;

fn main() {
    logging::init();
    log::info!("Navtri starting...");

    let args: Vec<String> = std::env::args().collect();
    let config = match parse_path_arg(&args, "--config") {
        Some(path) => match NavConfig::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => NavConfig::default(),
    };
    let agent = match parse_path_arg(&args, "--agent") {
        Some(path) => match AgentParams::load(&path) {
            Ok(agent) => agent,
            Err(e) => {
                log::error!("Failed to load agent params {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => AgentParams::default(),
    };
    let ticks = parse_number_arg(&args, "--ticks").unwrap_or(2_000);
    let seed = parse_number_arg(&args, "--seed").unwrap_or(TerrainParams::default().seed as usize) as u32;
    let debug_port = parse_number_arg(&args, "--debug-port").map(|p| p as u16);

    let scene = build_scene(seed);
    let start = Vec3::new(2.0, 8.0, 2.0);
    let session = match NavSession::new(config, agent, scene, start) {
        Ok(session) => Arc::new(tokio::sync::Mutex::new(session)),
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(port) = debug_port {
        // Debug server in a background thread with its own tokio runtime
        let handler = session.clone();
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create tokio runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async {
                let _server = navtri_debug::DebugServer::start(handler, port);
                log::info!("Debug server started on port {}", port);
                // Keep runtime alive forever
                loop {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
            });
        });
    }

    for tick in 0..ticks {
        let mut session = session.blocking_lock();
        let observer = start + Vec3::X * (tick as f32 * WALK_STEP);
        session.move_observer(observer);
        session.tick();

        if tick % 500 == 499 {
            let stats = session.world().stats();
            log::info!(
                "tick {}: chunk {}, {} live entities, {} vertices, {} triangles, {} links, {:.2}ms avg",
                tick + 1,
                stats.current_chunk,
                stats.live_entities,
                stats.graph.vertices,
                stats.graph.triangles,
                stats.graph.links,
                stats.ticks.one_sec.avg_ms
            );
        }
    }

    {
        let mut session = session.blocking_lock();
        let drained = session.run_until_idle(100_000);
        log::info!("Pipeline drained after {} more ticks", drained);

        let observer = session.observer();
        let destination = observer + Vec3::new(-12.0, 0.0, 10.0);
        match session.find_path(observer, destination) {
            Ok(path) => log::info!(
                "Path: {} waypoints from {} nodes, cost {:.1}, {} expanded",
                path.waypoints.len(),
                path.raw.len(),
                path.cost,
                path.expanded
            ),
            Err(e) => log::warn!("No path: {}", e),
        }
    }

    if debug_port.is_some() {
        log::info!("Serving debug requests, Ctrl-C to quit");
        loop {
            session.blocking_lock().tick();
            std::thread::sleep(Duration::from_millis(16));
        }
    }
}

/// Terrain tiles plus a row of crates across the walk
fn build_scene(seed: u32) -> StaticScene {
    let generator = TerrainGenerator::new(TerrainParams {
        seed,
        ..TerrainParams::default()
    });
    let mut scene = StaticScene::new();
    generator.populate(&mut scene, 4, 0);

    for i in 0..6 {
        let x = 6.0 + i as f32 * 9.0;
        let z = if i % 2 == 0 { 6.0 } else { -4.0 };
        let ground = generator.height_at(x, z);
        scene.add_box(
            Vec3::new(x, ground + 1.0, z),
            Vec3::new(1.5, 1.0, 1.5),
            Quat::from_rotation_y(i as f32 * 0.4),
            1,
        );
    }
    log::info!("Scene: {} entities", scene.len());
    scene
}

/// Parse a `--flag <path>` argument
fn parse_path_arg(args: &[String], flag: &str) -> Option<String> {
    let i = args.iter().position(|a| a == flag)?;
    args.get(i + 1).cloned()
}

/// Parse a `--flag <number>` argument
fn parse_number_arg(args: &[String], flag: &str) -> Option<usize> {
    let i = args.iter().position(|a| a == flag)?;
    args.get(i + 1)?.parse().ok()
}
