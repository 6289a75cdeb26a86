//! Interactive slice viewer for multi-resolution volumes.
//!
//! Three orthogonal projection planes are cut into sub-surfaces; each
//! sub-surface is bound to the volume chunks it overlaps at the current
//! resolution level and drawn with `wgpu`.

pub mod app;
pub mod camera;
pub mod config;
pub mod data;
pub mod renderer;
pub mod scene;
