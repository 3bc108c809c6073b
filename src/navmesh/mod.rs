//! Incremental navmesh construction
//!
//! Static geometry is discovered through a [`GeometryProvider`](crate::scene::GeometryProvider),
//! registered per entity, and turned into a merged-vertex, adjacency-linked
//! triangle graph by a staged, time-sliced [`BuildPipeline`] driven by the
//! observer's [`AreaTracker`](crate::streaming::AreaTracker) rings.

pub mod config;
pub mod entity;
pub mod node;
pub mod graph;
pub mod stage;
pub mod stages;
pub mod pipeline;
pub mod world;

pub use config::NavConfig;
pub use entity::{EntityId, EntityRegistry, LayerMask, PipelinePosition, SourceEntity, SourceGeometry};
pub use node::TriangleNode;
pub use graph::{GraphStats, NavGraph};
pub use stage::{StageId, StageState, StepOutcome, WorkItem, WorkSource, STAGE_PLAN};
pub use pipeline::{BuildPipeline, PipelineStats, StepAction, StepReport};
pub use world::{NavWorld, WorldStats};
