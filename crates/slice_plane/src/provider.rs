//! The seam to the level manager that owns chunk loading and caching.

use crate::binding::ChunkBinding;
use glam::Vec3;

/// Chunks returned for one query, closest first (the provider decides ties).
/// At most [`MAX_CHUNKS`](crate::MAX_CHUNKS) entries are consumed.
pub type ChunkQuery = Vec<ChunkBinding>;

/// Source of texture chunks at a given resolution level.
///
/// The same provider is shared by every plane in a scene, hence `Send + Sync`.
/// Queries must be cheap and non-blocking: they run once per sub-surface on
/// every synchronization pass.
pub trait ChunkProvider: Send + Sync {
    /// The up-to-eight chunks closest to `world_point` at `level`.
    /// An empty result means there is no loaded data in that region.
    fn closest_chunks(&self, world_point: Vec3, level: u32) -> ChunkQuery;

    /// World-space edge length of one chunk at `level`.
    fn chunk_edge_length_world(&self, level: u32) -> f32;
}
