//! Error types for navtri

use thiserror::Error;

use crate::navmesh::EntityId;
use crate::spatial::{ChunkCoord, Locator};

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("chunk {0} not found")]
    ChunkNotFound(ChunkCoord),

    #[error("no value at {0}")]
    SlotNotFound(Locator),

    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for the lookup-miss family (absent chunk, slot or entity).
    ///
    /// These are expected while the graph is still being built and callers
    /// treat them as "nothing here" rather than as failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ChunkNotFound(_) | Error::SlotNotFound(_) | Error::EntityNotFound(_)
        )
    }
}
