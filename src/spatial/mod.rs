//! Sparse chunked spatial containers
//!
//! The world is cut into cubic chunks of `chunk_size`. Each chunk of a
//! [`ChunkIndex`] is further split into `dimension³` leaves so lookups near a
//! point only touch a handful of short lists. [`ChunkKeyedMap`] is the
//! chunk-scoped key/value companion used for bookkeeping during the build.

pub mod coord;
pub mod locator;
pub mod column;
pub mod chunk_index;
pub mod keyed_map;

pub use coord::{ChunkCoord, ColumnCoord};
pub use locator::{LeafSlot, Locator};
pub use column::ColumnIndex;
pub use chunk_index::{Chunk, ChunkIndex};
pub use keyed_map::ChunkKeyedMap;
