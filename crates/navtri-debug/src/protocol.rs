//! Debug protocol - JSON command/response definitions

use serde::{Deserialize, Serialize};

/// Commands sent by a debug client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum DebugCommand {
    /// Ping (health check)
    Ping,
    /// Ring membership around the observer
    GetRings,
    /// Per-level backlog and stage queue depths
    GetPipeline,
    /// Entity, graph, pipeline and tick counters
    GetStats,
    /// Triangle nodes stored in one chunk
    GetChunkTriangles { x: i32, y: i32, z: i32 },
    /// Run a path query
    FindPath { from: [f32; 3], to: [f32; 3] },
    /// Set the observer position used by the next tick
    MoveObserver { x: f32, y: f32, z: f32 },
}

/// Responses from debug server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum DebugResponse {
    #[serde(rename = "ok")]
    Ok { data: ResponseData },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Response data variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    None,
    Pong { message: String },
    Rings {
        current_chunk: [i32; 3],
        rings: Vec<RingInfo>,
    },
    Pipeline {
        idle: bool,
        levels: Vec<LevelInfo>,
    },
    Stats {
        live_entities: usize,
        known_entities: usize,
        vertices: usize,
        triangles: usize,
        links: usize,
        steps: u64,
        items_completed: u64,
        budget_overruns: u64,
        avg_tick_ms: f32,
        max_tick_ms: f32,
    },
    ChunkTriangles {
        chunk: [i32; 3],
        triangles: Vec<TriangleInfo>,
    },
    PathResult {
        found: bool,
        waypoints: Vec<[f32; 3]>,
        raw_len: usize,
        expanded: usize,
        cost: f32,
        failure: Option<String>,
    },
    ObserverMoved {
        position: [f32; 3],
        chunk: [i32; 3],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingInfo {
    pub level: usize,
    /// Sorted (x, z) column coordinates
    pub columns: Vec<[i32; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: usize,
    pub backlog: usize,
    pub stages: Vec<StageQueueInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageQueueInfo {
    pub name: String,
    pub queued: usize,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleInfo {
    pub center: [f32; 3],
    pub corners: [[f32; 3]; 3],
    pub neighbors: usize,
}

impl DebugResponse {
    pub fn ok(data: ResponseData) -> Self {
        Self::Ok { data }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error {
            message: msg.into(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(ResponseData::Pong {
            message: "pong".into(),
        })
    }

    pub fn none() -> Self {
        Self::ok(ResponseData::None)
    }
}
