//! In-memory level manager standing in for the chunk cache.
//!
//! The volume occupies the cube `[origin, origin + extent]³` in world space.
//! At level `L` it is cut into cubes of edge `base_chunk_size / 2^L`; every
//! chunk gets a stable texture handle. No texel data is produced; the slice
//! shader derives a colour from the handle instead of sampling.

use anyhow::{bail, ensure, Result};
use glam::{IVec3, Vec3};
use slice_plane::{ChunkBinding, ChunkProvider, ChunkQuery, TextureHandle};

#[derive(Debug, Clone)]
pub struct SyntheticLevelManager {
    origin: Vec3,
    extent: f32,
    base_chunk_size: f32,
    max_level: u32,
    /// First handle of each level; handle 0 stays the placeholder.
    level_base: Vec<u32>,
}

impl SyntheticLevelManager {
    /// Fails when the pyramid needs more chunk handles than a 32-bit
    /// texture handle can address, or when the chunk size is not positive.
    pub fn new(origin: Vec3, extent: f32, base_chunk_size: f32, max_level: u32) -> Result<Self> {
        ensure!(
            base_chunk_size.is_finite() && base_chunk_size > 0.0,
            "chunk size must be positive, got {}",
            base_chunk_size
        );
        ensure!(extent.is_finite() && extent > 0.0, "volume extent must be positive, got {}", extent);

        let mut level_base = Vec::with_capacity(max_level as usize + 1);
        let mut next = 1u64;
        for level in 0..=max_level {
            let n = chunks_per_axis(extent, level_chunk_size(base_chunk_size, level)) as u64;
            let end = n
                .checked_pow(3)
                .and_then(|count| next.checked_add(count))
                .filter(|&end| end - 1 <= u64::from(u32::MAX));
            let Some(end) = end else {
                bail!(
                    "level {} needs {}^3 chunks; the pyramid exceeds the 32-bit texture handle range \
                     (raise the chunk size or lower the max level)",
                    level,
                    n
                );
            };
            level_base.push(next as u32);
            next = end;
        }

        log::info!(
            "Synthetic level manager: extent {:.3}, level-0 chunk {:.3}, levels 0..={} ({} handles)",
            extent,
            base_chunk_size,
            max_level,
            next - 1
        );

        Ok(Self {
            origin,
            extent,
            base_chunk_size,
            max_level,
            level_base,
        })
    }

    #[inline]
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Minimum corner of the volume in world space.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Center of the volume in world space.
    pub fn center(&self) -> Vec3 {
        self.origin + Vec3::splat(self.extent * 0.5)
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    fn chunks_per_axis(&self, level: u32) -> u32 {
        chunks_per_axis(self.extent, self.chunk_edge_length_world(level))
    }

    fn handle(&self, level: u32, idx: IVec3) -> TextureHandle {
        let n = u64::from(self.chunks_per_axis(level));
        let linear = (idx.z as u64 * n + idx.y as u64) * n + idx.x as u64;
        // `new` guarantees every handle of the pyramid fits in u32.
        TextureHandle((u64::from(self.level_base[level as usize]) + linear) as u32)
    }

    /// Human-readable description of a level, for logs and the window title.
    pub fn level_info(&self, level: u32) -> String {
        let level = level.min(self.max_level);
        let n = self.chunks_per_axis(level);
        format!(
            "level {} | {}x{}x{} chunks | chunk edge {:.4}",
            level,
            n,
            n,
            n,
            self.chunk_edge_length_world(level)
        )
    }
}

fn level_chunk_size(base: f32, level: u32) -> f32 {
    base * 2f32.powi(-(level.min(i32::MAX as u32) as i32))
}

fn chunks_per_axis(extent: f32, chunk: f32) -> u32 {
    ((extent / chunk).ceil() as u32).max(1)
}

impl ChunkProvider for SyntheticLevelManager {
    /// The 2×2×2 block of chunks whose centers surround `world_point`,
    /// clipped to the volume, nearest first (ties by x, then y, then z index).
    fn closest_chunks(&self, world_point: Vec3, level: u32) -> ChunkQuery {
        let level = level.min(self.max_level);
        let cs = self.chunk_edge_length_world(level);
        let n = self.chunks_per_axis(level) as i32;

        let rel = (world_point - self.origin) / cs;
        let lo = (rel - Vec3::splat(0.5)).floor().as_ivec3();

        let mut found: Vec<(f32, IVec3)> = Vec::with_capacity(8);
        for dz in 0..2 {
            for dy in 0..2 {
                for dx in 0..2 {
                    let idx = lo + IVec3::new(dx, dy, dz);
                    if idx.cmplt(IVec3::ZERO).any() || idx.cmpge(IVec3::splat(n)).any() {
                        continue;
                    }
                    let center = (idx.as_vec3() + Vec3::splat(0.5)) * cs;
                    found.push((center.distance_squared(rel * cs), idx));
                }
            }
        }

        found.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.x.cmp(&b.1.x))
                .then(a.1.y.cmp(&b.1.y))
                .then(a.1.z.cmp(&b.1.z))
        });

        found
            .into_iter()
            .map(|(_, idx)| ChunkBinding::new(self.handle(level, idx), self.origin + idx.as_vec3() * cs))
            .collect()
    }

    fn chunk_edge_length_world(&self, level: u32) -> f32 {
        level_chunk_size(self.base_chunk_size, level.min(self.max_level))
    }
}
