// src/lib.rs
//! Chunked-texture projection planes for a multi-resolution volume viewer.
//!
//! A [`ProjectionPlane`] is a rectangular cross-section through the volume,
//! subdivided into a fixed grid of square sub-surfaces. Each sub-surface is
//! half a texture chunk wide at the current resolution level, so its
//! footprint can never touch more than 2×2×2 chunks. Every synchronization
//! pass asks a [`ChunkProvider`] for the (at most) eight chunks closest to
//! each sub-surface center and rewrites that sub-surface's [`BindingState`].
//!
//! - `grid`: sub-surface layout and the binding-state arena.
//! - `plane`: pose, resolution level and world-space queries.
//! - `sync`: the uniform synchronizer (full and windowed passes).
//! - `binding`: slot records, placeholders and the std140 upload record.
//! - `coords`: voxel ↔ unit axis transforms.

pub mod binding;
pub mod coords;
pub mod error;
pub mod grid;
pub mod plane;
pub mod provider;
pub mod sync;

// Re-export commonly used types for convenience.
pub use self::binding::{BindingState, BindingUniformStd140, ChunkBinding, TextureHandle, MAX_CHUNKS};
pub use self::coords::{AxisDescriptor, VolumeAxes};
pub use self::error::{PlaneError, Result};
pub use self::grid::{GridDims, SubSurface, SubSurfaceGeometry, SubSurfaceGrid};
pub use self::plane::{PlaneConfig, ProjectionPlane, WorldBounds, MAX_LEVEL_LIMIT};
pub use self::provider::{ChunkProvider, ChunkQuery};
pub use self::sync::SyncReport;
