//! Path queries against hand-made and built graphs.

use navtri::core::types::{Quat, Vec3};
use navtri::navmesh::{NavConfig, NavWorld, TriangleNode};
use navtri::path::{AgentParams, PathFailure, PathReconstruction, PathfindingAgent, SearchStop};
use navtri::scene::{GroundProjector, StaticScene, TerrainGenerator, TerrainParams};
use navtri::spatial::{ChunkCoord, ChunkIndex, Locator};

fn floor() -> StaticScene {
    let mut scene = StaticScene::new();
    scene.add_box(Vec3::new(4.0, -0.5, 0.0), Vec3::new(8.0, 0.5, 4.0), Quat::IDENTITY, 0);
    scene
}

/// Nodes one meter apart along +X, each linked to the next
fn line_graph(n: usize) -> ChunkIndex<TriangleNode> {
    let mut triangles = ChunkIndex::new(16.0, 3);
    let corner = Locator::new(ChunkCoord::new(0, 0, 0), 0, 0);
    let nodes: Vec<Locator> = (0..n)
        .map(|i| {
            let center = Vec3::new(i as f32, 0.0, 0.0);
            triangles.add(TriangleNode::new(center, [corner; 3]), center)
        })
        .collect();
    for pair in nodes.windows(2) {
        triangles.get_mut(&pair[0]).unwrap().add_neighbor(pair[1]);
        triangles.get_mut(&pair[1]).unwrap().add_neighbor(pair[0]);
    }
    triangles
}

fn built_terrain() -> (StaticScene, NavWorld) {
    let generator = TerrainGenerator::new(TerrainParams::default());
    let mut scene = StaticScene::new();
    generator.populate(&mut scene, 1, 0);

    let config = NavConfig {
        work_budget_ms: 10_000.0,
        ..NavConfig::default()
    };
    let mut world = NavWorld::new(config, Vec3::new(8.0, 10.0, 8.0)).unwrap();
    world.run_until_idle(&scene, 1_000_000);
    (scene, world)
}

#[test]
fn test_nine_node_line() {
    let triangles = line_graph(9);
    for reconstruction in [PathReconstruction::BackPointers, PathReconstruction::ExpansionOrder] {
        let agent = PathfindingAgent::new(AgentParams {
            reconstruction,
            ..AgentParams::default()
        });
        let path = agent
            .find_path(Vec3::new(0.0, 1.0, 0.0), Vec3::new(8.0, 1.0, 0.0), &triangles, &floor())
            .unwrap();
        assert_eq!(path.raw.len(), 9);
        assert_eq!(path.raw.first(), Some(&Vec3::ZERO));
        assert_eq!(path.raw.last(), Some(&Vec3::new(8.0, 0.0, 0.0)));
        assert_eq!(path.waypoints.len(), 2);
    }
}

#[test]
fn test_perception_radius_limits_search() {
    let triangles = line_graph(9);
    let agent = PathfindingAgent::new(AgentParams {
        perception_radius: 3.0,
        ..AgentParams::default()
    });
    // Just above the ground so the short probe still lands
    let err = agent
        .find_path(Vec3::new(0.0, 1.0, 0.0), Vec3::new(8.0, 0.5, 0.0), &triangles, &floor())
        .unwrap_err();
    assert_eq!(err, PathFailure::Unreachable(SearchStop::OpenListExhausted));
}

#[test]
fn test_path_across_built_terrain() {
    let (scene, world) = built_terrain();
    let agent = PathfindingAgent::default();

    let from = Vec3::new(-9.3, 10.0, -10.7);
    let to = Vec3::new(20.4, 10.0, 19.6);
    let path = agent
        .find_path(from, to, &world.graph().triangles, &scene)
        .unwrap();

    assert!(path.raw.len() >= 2);
    assert!(path.waypoints.len() >= 2 && path.waypoints.len() <= path.raw.len());
    assert_eq!(path.waypoints.first(), path.raw.first());
    assert_eq!(path.waypoints.last(), path.raw.last());

    let straight = path.raw[0].distance(path.raw[path.raw.len() - 1]);
    assert!(path.cost >= straight - 1e-3);

    let goal = world.graph().triangles.get(&path.goal_node).unwrap().center;
    assert_eq!(path.raw.last(), Some(&goal));
    assert!(goal.distance(Vec3::new(20.4, goal.y, 19.6)) < 3.0);
}

#[test]
fn test_unreachable_beyond_perception_on_terrain() {
    let (scene, world) = built_terrain();
    let agent = PathfindingAgent::new(AgentParams {
        perception_radius: 8.0,
        ..AgentParams::default()
    });

    let start = scene.project_down(Vec3::new(-9.3, 20.0, -10.7), 50.0).unwrap() + Vec3::Y;
    let dest = scene.project_down(Vec3::new(20.4, 20.0, 19.6), 50.0).unwrap() + Vec3::Y * 0.5;
    let err = agent
        .find_path(start, dest, &world.graph().triangles, &scene)
        .unwrap_err();
    assert!(matches!(err, PathFailure::Unreachable(_)), "{:?}", err);
}

#[test]
fn test_off_mesh_queries() {
    let (scene, world) = built_terrain();
    let agent = PathfindingAgent::default();
    let err = agent
        .find_path(Vec3::new(500.0, 10.0, 0.0), Vec3::ZERO, &world.graph().triangles, &scene)
        .unwrap_err();
    assert_eq!(err, PathFailure::StartOffGround);

    let empty = ChunkIndex::new(16.0, 3);
    let err = agent
        .find_path(Vec3::new(0.7, 10.0, 0.3), Vec3::new(4.3, 10.0, 4.6), &empty, &scene)
        .unwrap_err();
    assert_eq!(err, PathFailure::NoStartNode);
}
