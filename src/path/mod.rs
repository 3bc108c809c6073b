//! Path queries over the triangle graph
//!
//! [`PathfindingAgent`] projects the endpoints onto the ground, snaps them
//! to the nearest triangle nodes, runs A* across neighbor links and then
//! thins the resulting polyline with line-of-sight checks.

pub mod agent;
pub mod astar;
pub mod simplify;

pub use agent::{AgentParams, Path, PathFailure, PathReconstruction, PathfindingAgent};
pub use astar::{SearchLimits, SearchResult, SearchStop};
pub use simplify::simplify;
