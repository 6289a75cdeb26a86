// src/data/mod.rs
//! Data handling modules for the slice viewer.
//!
//! This module provides:
//! - An in-memory level manager that serves chunks to the projection planes.
//! - The GPU-side records and buffers for sub-surface uniforms.

pub mod level_manager;
pub mod types;

// Re-export commonly used types for convenience.
pub use self::level_manager::SyntheticLevelManager;
pub use self::types::{FrameUniformStd140, PlaneGpu, SubSurfaceGpu, SubSurfaceUniformStd140};
