//! Rendering orchestrator. Owns the GPU context, the depth target and the
//! slice pipeline.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{context::GfxContext, pipelines::slice::SlicePipeline, targets::Targets};
use crate::{camera::Camera, data::types::PlaneGpu};
use std::sync::Arc;
use winit::window::Window;

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub slice: SlicePipeline,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, vsync: bool) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window, vsync).await?;
        let targets = Targets::new(&gfx.device, gfx.size);
        let slice = SlicePipeline::new(&gfx.device, gfx.config.format, targets.depth_fmt);

        Ok(Self {
            gfx,
            targets,
            slice,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size);
        }
    }

    /// Draws all planes into `swap_view` in a single pass.
    pub fn render(&mut self, swap_view: &wgpu::TextureView, planes: &[PlaneGpu], camera: &Camera) {
        self.slice
            .write_frame(&self.gfx.queue, &camera.make_frame_uniform());

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Slice Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for plane in planes {
                self.slice.draw_plane(&mut pass, plane);
            }
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
