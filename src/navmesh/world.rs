//! Tick driver tying the tracker, registry, graph and pipeline together

use serde::{Deserialize, Serialize};

use crate::core::time::{TickStats, TickTimer};
use crate::core::types::{Result, Vec3};
use crate::scene::{ClearanceTester, GeometryProvider};
use crate::spatial::ChunkCoord;
use crate::streaming::AreaTracker;

use super::config::NavConfig;
use super::entity::{EntityId, EntityRegistry};
use super::graph::{GraphStats, NavGraph};
use super::pipeline::{BuildPipeline, PipelineStats, StepReport};
use super::stages::StageContext;

/// Snapshot of the whole build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldStats {
    pub current_chunk: ChunkCoord,
    pub live_entities: usize,
    pub known_entities: usize,
    pub idle: bool,
    pub graph: GraphStats,
    pub pipeline: PipelineStats,
    pub ticks: TickStats,
}

/// Owns everything the incremental build needs.
///
/// Call [`NavWorld::tick`] once per frame with the observer position. The
/// first tick seeds the pipeline with the full initial footprint unless
/// [`NavWorld::bootstrap`] was called explicitly.
pub struct NavWorld {
    config: NavConfig,
    tracker: AreaTracker,
    registry: EntityRegistry,
    graph: NavGraph,
    pipeline: BuildPipeline,
    timer: TickTimer,
    observer: Vec3,
    bootstrapped: bool,
}

impl NavWorld {
    pub fn new(config: NavConfig, observer: Vec3) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Navmesh world: chunk size {}, rings {:?}, budget {}ms",
            config.chunk_size,
            config.ring_widths,
            config.work_budget_ms
        );
        Ok(Self {
            tracker: AreaTracker::new(config.chunk_size, &config.ring_widths, observer),
            registry: EntityRegistry::new(config.chunk_size),
            graph: NavGraph::new(&config),
            pipeline: BuildPipeline::new(config.level_count()),
            timer: TickTimer::new(),
            observer,
            bootstrapped: false,
            config,
        })
    }

    /// Discover geometry and seed the pipeline with the initial rings.
    /// Later calls only re-run discovery. Returns newly discovered entities.
    pub fn bootstrap(&mut self, provider: &dyn GeometryProvider) -> usize {
        let added = self.registry.discover(provider, self.config.layer_mask);
        if self.bootstrapped {
            self.schedule_late(&added);
        } else {
            self.tracker.dump_into(self.pipeline.backlogs_mut(), true);
            self.bootstrapped = true;
            log::info!(
                "Bootstrapped around chunk {} with {} entities",
                self.tracker.current_chunk(),
                self.registry.live_count()
            );
        }
        added.len()
    }

    /// Re-queue the already tracked columns of entities discovered after
    /// those columns were swept. Untracked columns are picked up when the
    /// rings reach them.
    fn schedule_late(&mut self, ids: &[EntityId]) {
        let backlogs = self.pipeline.backlogs_mut();
        for &id in ids {
            let Ok(columns) = self.registry.columns_of(id) else {
                continue;
            };
            let mut queued = 0;
            for column in columns {
                if self.tracker.reschedule(column, backlogs) {
                    queued += 1;
                }
            }
            if queued > 0 {
                log::debug!("Entity {} appeared in {} tracked columns, rescheduled", id, queued);
            }
        }
    }

    /// Sample the observer and run one pipeline step
    pub fn tick<S: GeometryProvider + ClearanceTester>(&mut self, observer: Vec3, scene: &S) -> StepReport {
        if !self.bootstrapped {
            self.bootstrap(scene);
        }

        self.timer.begin();
        self.observer = observer;
        if self.tracker.update(observer) {
            let added = if self.config.map_expanding {
                self.registry.discover(scene, self.config.layer_mask)
            } else {
                Vec::new()
            };
            self.tracker.dump_into(self.pipeline.backlogs_mut(), false);
            self.schedule_late(&added);
        }

        let mut ctx = StageContext {
            config: &self.config,
            registry: &mut self.registry,
            graph: &mut self.graph,
            clearance: Some(scene as &dyn ClearanceTester),
        };
        let report = self.pipeline.step(&mut ctx);
        self.timer.end();
        report
    }

    /// Tick in place until the pipeline drains or `max_ticks` pass.
    /// Returns the number of ticks run.
    pub fn run_until_idle<S: GeometryProvider + ClearanceTester>(&mut self, scene: &S, max_ticks: usize) -> usize {
        let observer = self.observer;
        let mut ticks = 0;
        while ticks < max_ticks {
            self.tick(observer, scene);
            ticks += 1;
            if self.pipeline.is_idle() {
                break;
            }
        }
        ticks
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn observer(&self) -> Vec3 {
        self.observer
    }

    pub fn tracker(&self) -> &AreaTracker {
        &self.tracker
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn pipeline(&self) -> &BuildPipeline {
        &self.pipeline
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            current_chunk: self.tracker.current_chunk(),
            live_entities: self.registry.live_count(),
            known_entities: self.registry.known_count(),
            idle: self.pipeline.is_idle(),
            graph: self.graph.stats(),
            pipeline: self.pipeline.stats(),
            ticks: self.timer.stats(),
        }
    }
}
