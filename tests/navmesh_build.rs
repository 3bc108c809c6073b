//! End-to-end builds through `NavWorld` against an in-memory scene.

use std::collections::HashMap;

use navtri::core::types::Vec3;
use navtri::navmesh::{EntityId, NavConfig, NavWorld, SourceGeometry};
use navtri::scene::{StaticScene, TerrainGenerator, TerrainParams};
use navtri::spatial::{ColumnCoord, Locator};
use navtri::streaming::AreaTracker;

/// Flat 2×2 m quad whose minimum corner sits at `origin`
fn quad(id: u64, origin: Vec3) -> SourceGeometry {
    SourceGeometry::from_heightfield(EntityId(id), origin, 2.0, 2, 2, &[0.0; 4], 0)
}

fn small_config() -> NavConfig {
    NavConfig {
        chunk_size: 10.0,
        work_budget_ms: 10_000.0,
        ..NavConfig::default()
    }
}

fn terrain_scene(radius: i32) -> StaticScene {
    let generator = TerrainGenerator::new(TerrainParams::default());
    let mut scene = StaticScene::new();
    generator.populate(&mut scene, radius, 0);
    scene
}

fn build(config: NavConfig, scene: &StaticScene, observer: Vec3) -> NavWorld {
    let mut world = NavWorld::new(config, observer).unwrap();
    let ticks = world.run_until_idle(scene, 1_000_000);
    assert!(world.pipeline().is_idle(), "still busy after {} ticks", ticks);
    world
}

/// Every triangle as (center, sorted neighbor centers), sorted, bitwise
fn graph_signature(world: &NavWorld) -> Vec<([u32; 3], Vec<[u32; 3]>)> {
    let bits = |v: Vec3| v.to_array().map(f32::to_bits);
    let triangles = &world.graph().triangles;
    let mut signature: Vec<_> = triangles
        .iter()
        .map(|(_, node)| {
            let mut neighbors: Vec<_> = node
                .neighbors()
                .iter()
                .map(|n| bits(triangles.get(n).unwrap().center))
                .collect();
            neighbors.sort();
            (bits(node.center), neighbors)
        })
        .collect();
    signature.sort();
    signature
}

#[test]
fn test_ring_scenario() {
    let mut tracker = AreaTracker::new(10.0, &[1], Vec3::new(5.0, 0.0, 5.0));
    let mut backlog = vec![Vec::new()];
    tracker.dump_into(&mut backlog, true);
    assert_eq!(backlog[0].len(), 9);

    backlog[0].clear();
    assert!(tracker.update(Vec3::new(15.0, 0.0, 5.0)));
    tracker.dump_into(&mut backlog, false);

    let mut delta = backlog[0].clone();
    delta.sort();
    assert_eq!(
        delta,
        vec![ColumnCoord::new(2, -1), ColumnCoord::new(2, 0), ColumnCoord::new(2, 1)]
    );
}

#[test]
fn test_vertices_merge_within_threshold() {
    let mut scene = StaticScene::new();
    scene.add(quad(0, Vec3::new(1.0, 0.0, 1.0)));
    scene.add(quad(1, Vec3::new(3.0, 0.3, 1.0)));

    let world = build(small_config(), &scene, Vec3::new(2.0, 1.0, 2.0));
    let stats = world.graph().stats();
    assert_eq!(stats.triangles, 4);
    // Two shared corners weld, the quads link across the seam
    assert_eq!(stats.links, 5);
    assert_eq!(stats.pending_merges, 0);
    assert_eq!(stats.pending_corners, 0);
    assert_eq!(world.registry().live_count(), 0);
}

#[test]
fn test_vertices_stay_apart_beyond_threshold() {
    let mut scene = StaticScene::new();
    scene.add(quad(0, Vec3::new(1.0, 0.0, 1.0)));
    scene.add(quad(1, Vec3::new(3.0, 0.7, 1.0)));

    let world = build(small_config(), &scene, Vec3::new(2.0, 1.0, 2.0));
    let stats = world.graph().stats();
    assert_eq!(stats.triangles, 4);
    assert_eq!(stats.links, 2);
}

#[test]
fn test_wide_strips_weld_along_their_whole_seam() {
    // Two 58 m strips sharing the edge z = 3, wider than the merge ring
    let strip = |id, z: f32| SourceGeometry::from_heightfield(EntityId(id), Vec3::new(1.0, 0.0, z), 2.0, 30, 2, &[0.0; 60], 0);
    let mut scene = StaticScene::new();
    scene.add(strip(1, 1.0));
    scene.add(strip(2, 3.0));

    let mut world = build(small_config(), &scene, Vec3::new(5.0, 1.0, 5.0));
    let distinct_corners = |world: &NavWorld| {
        let mut corners: Vec<Locator> = world.graph().triangles.iter().flat_map(|(_, node)| node.corners).collect();
        corners.sort();
        corners.dedup();
        corners.len()
    };

    let stats = world.stats();
    assert_eq!(stats.graph.vertices, 120);
    assert_eq!(stats.graph.triangles, 116);
    assert_eq!(stats.graph.pending_merges, 0);
    assert_eq!(stats.live_entities, 0);
    assert_eq!(distinct_corners(&world), 90);

    // Far columns entering the merge ring later leave nothing behind
    world.tick(Vec3::new(35.0, 1.0, 5.0), &scene);
    world.run_until_idle(&scene, 1_000_000);
    let stats = world.stats();
    assert_eq!(stats.graph.pending_merges, 0);
    assert_eq!(distinct_corners(&world), 90);
}

#[test]
fn test_neighbors_symmetric_and_complete() {
    let scene = terrain_scene(1);
    let config = NavConfig {
        work_budget_ms: 10_000.0,
        ..NavConfig::default()
    };
    let world = build(config, &scene, Vec3::new(8.0, 5.0, 8.0));
    let triangles = &world.graph().triangles;
    assert!(!triangles.is_empty());

    let mut users: HashMap<Locator, Vec<Locator>> = HashMap::new();
    for (locator, node) in triangles.iter() {
        for &neighbor in node.neighbors() {
            assert_ne!(neighbor, locator, "self link at {}", locator);
            assert!(
                triangles.get(&neighbor).unwrap().is_linked_to(&locator),
                "{} -> {} is one-way",
                locator,
                neighbor
            );
        }
        for corner in node.corners {
            users.entry(corner).or_default().push(locator);
        }
    }

    for (corner, sharing) in &users {
        for (k, a) in sharing.iter().enumerate() {
            for b in &sharing[k + 1..] {
                assert!(
                    triangles.get(a).unwrap().is_linked_to(b),
                    "{} and {} share {} but are not linked",
                    a,
                    b,
                    corner
                );
            }
        }
    }
}

#[test]
fn test_sliced_build_matches_unbounded() {
    let scene = terrain_scene(1);
    let observer = Vec3::new(8.0, 5.0, 8.0);

    let unbounded = build(
        NavConfig {
            work_budget_ms: 10_000.0,
            max_items_per_step: None,
            ..NavConfig::default()
        },
        &scene,
        observer,
    );
    let sliced = build(
        NavConfig {
            work_budget_ms: 10_000.0,
            max_items_per_step: Some(1),
            ..NavConfig::default()
        },
        &scene,
        observer,
    );

    assert!(sliced.pipeline().stats().resumptions > 0);
    assert!(sliced.pipeline().stats().steps > unbounded.pipeline().stats().steps);
    assert_eq!(sliced.graph().stats(), unbounded.graph().stats());
    assert_eq!(graph_signature(&sliced), graph_signature(&unbounded));
}

#[test]
fn test_graph_grows_as_observer_moves() {
    let scene = terrain_scene(3);
    let config = NavConfig {
        work_budget_ms: 10_000.0,
        ..NavConfig::default()
    };
    let mut world = build(config, &scene, Vec3::new(8.0, 5.0, 8.0));
    let before = world.graph().stats().triangles;
    assert!(before > 0);

    let moved = Vec3::new(56.0, 5.0, 8.0);
    world.tick(moved, &scene);
    assert!(world.tracker().is_dirty());
    world.run_until_idle(&scene, 1_000_000);

    assert_eq!(world.tracker().current_chunk().x, 3);
    assert!(world.graph().stats().triangles > before);
    assert!(world.pipeline().is_idle());
}
