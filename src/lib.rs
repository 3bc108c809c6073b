//! Navtri - incremental chunked navmesh builder and A* pathfinder

pub mod core;
pub mod math;
pub mod spatial;
pub mod streaming;
pub mod navmesh;
pub mod path;
pub mod scene;
pub mod session;
