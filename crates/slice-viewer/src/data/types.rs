//! Core data types for the slice viewer, focused on GPU data representation.

use glam::Mat4;
use slice_plane::{BindingState, BindingUniformStd140};

/// Per-frame uniform, shared by every sub-surface draw.
/// Must match `Frame` in `slice.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniformStd140 {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

const _: [(); 64] = [(); core::mem::size_of::<FrameUniformStd140>()];

/// Per-sub-surface uniform: placement of the shared quad plus its chunk bindings.
/// Must match `SubSurface` in `slice.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SubSurfaceUniformStd140 {
    /// Unit quad -> world transform.
    pub model: [[f32; 4]; 4],        // 64 B
    pub binding: BindingUniformStd140, // +176 -> 240
}

const _: [(); 240] = [(); core::mem::size_of::<SubSurfaceUniformStd140>()];

impl SubSurfaceUniformStd140 {
    pub fn new(model: Mat4, binding: &BindingState) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            binding: binding.to_uniform(),
        }
    }
}

/// GPU resources of one sub-surface.
#[derive(Debug)]
pub struct SubSurfaceGpu {
    /// Uniform buffer containing `SubSurfaceUniformStd140` data.
    pub ubo: wgpu::Buffer,
    /// Bind group connecting the UBO to the slice pipeline.
    pub bind: wgpu::BindGroup,
    /// False while no chunk is bound; such sub-surfaces are skipped at draw time.
    pub has_chunks: bool,
}

/// GPU resources of one projection plane, indexed like its sub-surfaces.
#[derive(Debug)]
pub struct PlaneGpu {
    pub subs: Vec<SubSurfaceGpu>,
}
