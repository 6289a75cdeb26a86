use crate::data::types::{
    FrameUniformStd140 as FrameUniform, PlaneGpu, SubSurfaceGpu,
    SubSurfaceUniformStd140 as SubSurfaceUniform,
};
use slice_plane::grid::UNIT_QUAD;
use wgpu::util::DeviceExt;

/// Draws projection planes as one textured quad per sub-surface.
pub struct SlicePipeline {
    pipeline:       wgpu::RenderPipeline,
    pub sub_layout: wgpu::BindGroupLayout,
    frame_ubo:      wgpu::Buffer,
    frame_bind:     wgpu::BindGroup,
    quad_vb:        wgpu::Buffer,
}

impl SlicePipeline {
    pub fn new(
        device:    &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        // Group 0: per-frame camera
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label:   Some("Slice Frame UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding:    0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty:                 wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size:   wgpu::BufferSize::new(
                        std::mem::size_of::<FrameUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        // Group 1: per-sub-surface placement and chunk bindings
        let sub_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label:   Some("Slice Sub-surface UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding:    0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty:                 wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size:   wgpu::BufferSize::new(
                        std::mem::size_of::<SubSurfaceUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let frame_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label:              Some("Slice Frame UBO"),
            size:               std::mem::size_of::<FrameUniform>() as u64,
            usage:              wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label:   Some("Slice Frame Bind Group"),
            layout:  &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding:  0,
                resource: frame_ubo.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label:  Some("shaders/slice.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/slice.wgsl").into()),
        });

        // Every sub-surface shares one unit quad; its model matrix sizes and places it.
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label:    Some("Slice Quad VB"),
            contents: bytemuck::cast_slice(&UNIT_QUAD),
            usage:    wgpu::BufferUsages::VERTEX,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label:                Some("Slice Pipeline Layout"),
            bind_group_layouts:   &[&frame_layout, &sub_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label:  Some("Slice Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module:      &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                    step_mode:    wgpu::VertexStepMode::Vertex,
                    attributes:   &[wgpu::VertexAttribute {
                        shader_location: 0,
                        offset:          0,
                        format:          wgpu::VertexFormat::Float32x2,
                    }],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module:      &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format:     color_fmt,
                    blend:      Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            // Planes are seen from both sides.
            primitive: wgpu::PrimitiveState {
                topology:  wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format:              depth_fmt,
                depth_write_enabled: true,
                depth_compare:       wgpu::CompareFunction::LessEqual,
                stencil:             wgpu::StencilState::default(),
                bias:                wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview:   None,
        });

        Self {
            pipeline,
            sub_layout,
            frame_ubo,
            frame_bind,
            quad_vb,
        }
    }

    /// Allocates one uniform buffer and bind group per sub-surface of a plane.
    pub fn create_plane_gpu(&self, device: &wgpu::Device, sub_surfaces: usize) -> PlaneGpu {
        let subs = (0..sub_surfaces)
            .map(|i| {
                let ubo = device.create_buffer(&wgpu::BufferDescriptor {
                    label:              Some(&format!("Sub-surface UBO {i}")),
                    size:               std::mem::size_of::<SubSurfaceUniform>() as u64,
                    usage:              wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label:   Some(&format!("Sub-surface Bind Group {i}")),
                    layout:  &self.sub_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding:  0,
                        resource: ubo.as_entire_binding(),
                    }],
                });
                SubSurfaceGpu {
                    ubo,
                    bind,
                    has_chunks: false,
                }
            })
            .collect();

        PlaneGpu { subs }
    }

    pub fn write_frame(&self, queue: &wgpu::Queue, frame: &FrameUniform) {
        queue.write_buffer(&self.frame_ubo, 0, bytemuck::bytes_of(frame));
    }

    /// Draws every sub-surface of a plane that has at least one chunk bound.
    pub fn draw_plane<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, plane: &'a PlaneGpu) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.frame_bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));

        for sub in plane.subs.iter().filter(|s| s.has_chunks) {
            rpass.set_bind_group(1, &sub.bind, &[]);
            rpass.draw(0..UNIT_QUAD.len() as u32, 0..1);
        }
    }
}
