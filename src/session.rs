//! A running build bundled with its scene and agent
//!
//! [`NavSession`] is what the demo binary ticks and what the debug server
//! inspects. Both reach it through one `Arc<tokio::sync::Mutex<_>>`.

use navtri_debug::{
    DebugCommand, DebugHandler, DebugResponse, LevelInfo, ResponseData, RingInfo, StageQueueInfo,
    TriangleInfo,
};

use crate::core::types::{Result, Vec3};
use crate::navmesh::{NavConfig, NavWorld, StepReport};
use crate::path::{AgentParams, Path, PathFailure, PathfindingAgent};
use crate::scene::StaticScene;
use crate::spatial::ChunkCoord;

pub struct NavSession {
    world: NavWorld,
    scene: StaticScene,
    agent: PathfindingAgent,
    observer: Vec3,
}

impl NavSession {
    pub fn new(config: NavConfig, agent: AgentParams, scene: StaticScene, observer: Vec3) -> Result<Self> {
        agent.validate()?;
        Ok(Self {
            world: NavWorld::new(config, observer)?,
            scene,
            agent: PathfindingAgent::new(agent),
            observer,
        })
    }

    /// One build step at the current observer position
    pub fn tick(&mut self) -> StepReport {
        self.world.tick(self.observer, &self.scene)
    }

    /// Tick until the build is idle or `max_ticks` pass
    pub fn run_until_idle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks {
            self.tick();
            ticks += 1;
            if self.world.pipeline().is_idle() {
                break;
            }
        }
        ticks
    }

    pub fn move_observer(&mut self, position: Vec3) {
        self.observer = position;
    }

    pub fn observer(&self) -> Vec3 {
        self.observer
    }

    pub fn find_path(&self, from: Vec3, to: Vec3) -> std::result::Result<Path, PathFailure> {
        self.agent
            .find_path(from, to, &self.world.graph().triangles, &self.scene)
    }

    pub fn world(&self) -> &NavWorld {
        &self.world
    }

    pub fn scene(&self) -> &StaticScene {
        &self.scene
    }

    pub fn agent(&self) -> &PathfindingAgent {
        &self.agent
    }

    fn rings(&self) -> ResponseData {
        let tracker = self.world.tracker();
        let chunk = tracker.current_chunk();
        let rings = tracker
            .snapshot()
            .into_iter()
            .enumerate()
            .map(|(level, columns)| RingInfo {
                level,
                columns: columns.iter().map(|c| [c.x, c.z]).collect(),
            })
            .collect();
        ResponseData::Rings {
            current_chunk: [chunk.x, chunk.y, chunk.z],
            rings,
        }
    }

    fn pipeline(&self) -> ResponseData {
        let pipeline = self.world.pipeline();
        let levels = pipeline
            .queue_depths()
            .into_iter()
            .enumerate()
            .map(|(level, stages)| LevelInfo {
                level,
                backlog: pipeline.backlog_len(level),
                stages: stages
                    .into_iter()
                    .enumerate()
                    .map(|(order, (stage, queued))| StageQueueInfo {
                        name: stage.name().to_string(),
                        queued,
                        cursor: pipeline.stage_state(level, order).map_or(0, |s| s.cursor),
                    })
                    .collect(),
            })
            .collect();
        ResponseData::Pipeline {
            idle: pipeline.is_idle(),
            levels,
        }
    }

    fn stats(&self) -> ResponseData {
        let stats = self.world.stats();
        ResponseData::Stats {
            live_entities: stats.live_entities,
            known_entities: stats.known_entities,
            vertices: stats.graph.vertices,
            triangles: stats.graph.triangles,
            links: stats.graph.links,
            steps: stats.pipeline.steps,
            items_completed: stats.pipeline.items_completed,
            budget_overruns: stats.pipeline.budget_overruns,
            avg_tick_ms: stats.ticks.five_sec.avg_ms,
            max_tick_ms: stats.ticks.five_sec.max_ms,
        }
    }

    fn chunk_triangles(&self, coord: ChunkCoord) -> Result<ResponseData> {
        let graph = self.world.graph();
        let triangles = graph
            .triangles
            .chunk_values(coord)?
            .into_iter()
            .map(|node| {
                let mut corners = [[0.0; 3]; 3];
                for (out, corner) in corners.iter_mut().zip(&node.corners) {
                    if let Ok(v) = graph.vertex(corner) {
                        *out = v.to_array();
                    }
                }
                TriangleInfo {
                    center: node.center.to_array(),
                    corners,
                    neighbors: node.neighbors().len(),
                }
            })
            .collect();
        Ok(ResponseData::ChunkTriangles {
            chunk: [coord.x, coord.y, coord.z],
            triangles,
        })
    }
}

impl DebugHandler for NavSession {
    fn handle_command(&mut self, cmd: DebugCommand) -> DebugResponse {
        match cmd {
            DebugCommand::Ping => DebugResponse::pong(),
            DebugCommand::GetRings => DebugResponse::ok(self.rings()),
            DebugCommand::GetPipeline => DebugResponse::ok(self.pipeline()),
            DebugCommand::GetStats => DebugResponse::ok(self.stats()),
            DebugCommand::GetChunkTriangles { x, y, z } => {
                match self.chunk_triangles(ChunkCoord::new(x, y, z)) {
                    Ok(data) => DebugResponse::ok(data),
                    Err(e) => DebugResponse::error(e.to_string()),
                }
            }
            DebugCommand::FindPath { from, to } => {
                let data = match self.find_path(Vec3::from_array(from), Vec3::from_array(to)) {
                    Ok(path) => ResponseData::PathResult {
                        found: true,
                        waypoints: path.waypoints.iter().map(|w| w.to_array()).collect(),
                        raw_len: path.raw.len(),
                        expanded: path.expanded,
                        cost: path.cost,
                        failure: None,
                    },
                    Err(failure) => ResponseData::PathResult {
                        found: false,
                        waypoints: Vec::new(),
                        raw_len: 0,
                        expanded: 0,
                        cost: 0.0,
                        failure: Some(failure.to_string()),
                    },
                };
                DebugResponse::ok(data)
            }
            DebugCommand::MoveObserver { x, y, z } => {
                let position = Vec3::new(x, y, z);
                self.move_observer(position);
                let chunk = ChunkCoord::from_world_pos(position, self.world.config().chunk_size);
                DebugResponse::ok(ResponseData::ObserverMoved {
                    position: [x, y, z],
                    chunk: [chunk.x, chunk.y, chunk.z],
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Quat;

    fn session() -> NavSession {
        let mut scene = StaticScene::new();
        scene.add_box(Vec3::new(5.0, -0.5, 5.0), Vec3::new(4.0, 0.5, 4.0), Quat::IDENTITY, 0);
        let config = NavConfig {
            chunk_size: 10.0,
            ..NavConfig::default()
        };
        NavSession::new(config, AgentParams::default(), scene, Vec3::new(5.0, 1.0, 5.0)).unwrap()
    }

    #[test]
    fn test_debug_commands() {
        let mut session = session();
        session.run_until_idle(1_000);

        assert_eq!(session.handle_command(DebugCommand::Ping), DebugResponse::pong());

        let DebugResponse::Ok { data: ResponseData::Rings { current_chunk, rings } } =
            session.handle_command(DebugCommand::GetRings)
        else {
            panic!("expected rings");
        };
        assert_eq!(current_chunk, [0, 0, 0]);
        assert_eq!(rings.len(), 4);
        assert_eq!(rings[0].columns.len(), 9);
        assert!(rings[0].columns.contains(&[0, 0]));

        let DebugResponse::Ok { data: ResponseData::Stats { triangles, links, .. } } =
            session.handle_command(DebugCommand::GetStats)
        else {
            panic!("expected stats");
        };
        assert_eq!(triangles, 2);
        assert_eq!(links, 1);

        let DebugResponse::Ok { data: ResponseData::Pipeline { idle, levels } } =
            session.handle_command(DebugCommand::GetPipeline)
        else {
            panic!("expected pipeline");
        };
        assert!(idle);
        assert_eq!(levels.len(), 4);
        assert_eq!(levels[3].stages.len(), 3);
    }

    #[test]
    fn test_chunk_triangles() {
        let mut session = session();
        session.run_until_idle(1_000);
        let DebugResponse::Ok { data: ResponseData::ChunkTriangles { triangles, .. } } =
            session.handle_command(DebugCommand::GetChunkTriangles { x: 0, y: 0, z: 0 })
        else {
            panic!("expected triangles");
        };
        assert_eq!(triangles.len(), 2);
        assert!(triangles.iter().all(|t| t.neighbors == 1));

        let missing = session.handle_command(DebugCommand::GetChunkTriangles { x: 9, y: 9, z: 9 });
        assert!(matches!(missing, DebugResponse::Error { .. }));
    }

    #[test]
    fn test_find_path_and_move() {
        let mut session = session();
        session.run_until_idle(1_000);
        let DebugResponse::Ok { data: ResponseData::PathResult { found, failure, .. } } =
            session.handle_command(DebugCommand::FindPath {
                from: [2.0, 1.0, 2.0],
                to: [8.0, 1.0, 8.0],
            })
        else {
            panic!("expected path result");
        };
        assert!(found, "{failure:?}");

        let moved = session.handle_command(DebugCommand::MoveObserver { x: 25.0, y: 1.0, z: 5.0 });
        assert_eq!(
            moved,
            DebugResponse::ok(ResponseData::ObserverMoved {
                position: [25.0, 1.0, 5.0],
                chunk: [2, 0, 0],
            })
        );
        assert_eq!(session.observer(), Vec3::new(25.0, 1.0, 5.0));
    }
}
