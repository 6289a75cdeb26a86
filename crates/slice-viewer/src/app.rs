use crate::{
    camera::{Camera, CameraController},
    config::Config,
    data::{types::PlaneGpu, SubSurfaceUniformStd140, SyntheticLevelManager},
    renderer::Renderer,
    scene::{OrthoPlanes, VolumeFrame},
};
use anyhow::Result;
use glam::{DVec3, Quat, Vec2, Vec3};
use slice_plane::ChunkProvider;
use std::sync::Arc;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

/// Rotation applied per key press, degrees.
const ROTATE_STEP_DEG: f32 = 5.0;

pub struct App {
    pub renderer: Renderer,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub planes: OrthoPlanes,
    plane_gpu: Vec<PlaneGpu>,
    volume: Arc<SyntheticLevelManager>,
    frame: VolumeFrame,
    goto_voxel: Option<DVec3>,
    cursor: Option<PhysicalPosition<f64>>,
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let renderer = Renderer::new(window.clone(), !config.no_vsync).await?;

        let volume = Arc::new(SyntheticLevelManager::new(
            Vec3::ZERO,
            1.0,
            config.chunk_size,
            config.max_level,
        )?);
        let frame = VolumeFrame {
            axes: config.volume_axes()?,
            origin: volume.origin(),
            extent: volume.extent(),
        };
        let goto_voxel = config.goto_voxel.map(|v| v.0);

        let mut planes = OrthoPlanes::new(config.plane_config(), volume.clone())?;
        planes.set_center(volume.center());
        let level = planes.set_level(config.level);
        if let Some(voxel) = goto_voxel {
            planes.set_center(frame.voxel_to_world(voxel));
        }

        let plane_gpu = planes
            .planes()
            .iter()
            .map(|p| {
                renderer
                    .slice
                    .create_plane_gpu(&renderer.gfx.device, p.grid().len())
            })
            .collect();

        let mut camera = Camera::new(planes.center(), 3.0, renderer.gfx.aspect());
        camera.frame_extent(planes.center(), planes.world_diagonal_extent());

        log::info!(
            "Volume {} voxels, {}x{} sub-surfaces per plane, starting at {}",
            config.volume,
            config.rows,
            config.cols,
            volume.level_info(level)
        );
        window.set_title(&title(&volume, level));

        Ok(Self {
            renderer,
            camera,
            camera_controller: CameraController::new(),
            planes,
            plane_gpu,
            volume,
            frame,
            goto_voxel,
            cursor: None,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.camera.aspect = self.renderer.gfx.aspect();
        }
    }

    /// Returns true when the event was consumed.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.camera_controller.handle_event(event, &mut self.camera);

        match event {
            WindowEvent::Resized(physical_size) => {
                self.resize(*physical_size);
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(*position);
                false
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: ElementState::Pressed,
                ..
            } => {
                self.report_pick();
                true
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(code) => self.handle_key(window, code),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, window: &Window, code: KeyCode) -> bool {
        let level = self.planes.level();
        let step = self.volume.chunk_edge_length_world(level) * 0.25;
        let angle = ROTATE_STEP_DEG.to_radians();

        match code {
            KeyCode::PageUp => self.change_level(window, level.saturating_add(1)),
            KeyCode::PageDown => self.change_level(window, level.saturating_sub(1)),
            KeyCode::ArrowLeft => self.planes.nudge(Vec3::new(-step, 0.0, 0.0)),
            KeyCode::ArrowRight => self.planes.nudge(Vec3::new(step, 0.0, 0.0)),
            KeyCode::ArrowDown => self.planes.nudge(Vec3::new(0.0, -step, 0.0)),
            KeyCode::ArrowUp => self.planes.nudge(Vec3::new(0.0, step, 0.0)),
            KeyCode::End => self.planes.nudge(Vec3::new(0.0, 0.0, -step)),
            KeyCode::Home => self.planes.nudge(Vec3::new(0.0, 0.0, step)),
            KeyCode::KeyR => self.planes.rotate(Quat::from_rotation_z(angle)),
            KeyCode::KeyT => self.planes.rotate(Quat::from_rotation_x(angle)),
            KeyCode::Backspace => {
                self.planes.set_rotation(Quat::IDENTITY);
                log::info!("Plane rotation reset");
            }
            KeyCode::KeyC => self.move_planes_to(self.volume.center()),
            KeyCode::KeyG => match self.goto_voxel {
                Some(voxel) => self.goto(voxel),
                None => log::info!("No target voxel configured (--goto-voxel)"),
            },
            _ => return false,
        }
        true
    }

    fn change_level(&mut self, window: &Window, requested: u32) {
        let before = self.planes.level();
        let applied = self.planes.set_level(requested);
        if applied != before {
            log::info!("Switched to {}", self.volume.level_info(applied));
            window.set_title(&title(&self.volume, applied));
            self.frame_planes();
        }
    }

    /// Fits the camera to the planes' current world extent.
    fn frame_planes(&mut self) {
        self.camera
            .frame_extent(self.planes.center(), self.planes.world_diagonal_extent());
    }

    fn move_planes_to(&mut self, center: Vec3) {
        self.planes.set_center(center);
        self.camera.target = center;
        self.camera.update();
    }

    /// Centers the planes on a voxel of the source data.
    fn goto(&mut self, voxel: DVec3) {
        let world = self.frame.voxel_to_world(voxel);
        log::info!(
            "Moving planes to voxel ({:.1}, {:.1}, {:.1}) at world ({:.4}, {:.4}, {:.4})",
            voxel.x, voxel.y, voxel.z, world.x, world.y, world.z
        );
        self.move_planes_to(world);
    }

    /// Logs the plane, world position and voxel position under the cursor.
    fn report_pick(&self) {
        let Some(cursor) = self.cursor else {
            return;
        };

        let size = self.renderer.gfx.size;
        let ndc = Vec2::new(
            (2.0 * cursor.x / size.width.max(1) as f64 - 1.0) as f32,
            (1.0 - 2.0 * cursor.y / size.height.max(1) as f64) as f32,
        );
        let (origin, dir) = self.camera.ray_through_ndc(ndc);

        match self.planes.pick(origin, dir) {
            Some((axis, hit)) => {
                let voxel = self.frame.world_to_voxel(hit);
                if self.frame.contains_voxel(voxel) {
                    log::info!(
                        "{} plane at world ({:.4}, {:.4}, {:.4}) -> voxel ({:.1}, {:.1}, {:.1})",
                        axis, hit.x, hit.y, hit.z, voxel.x, voxel.y, voxel.z
                    );
                } else {
                    log::info!(
                        "{} plane at world ({:.4}, {:.4}, {:.4}) is outside the volume data",
                        axis, hit.x, hit.y, hit.z
                    );
                }
            }
            None => log::debug!("Pick ray missed every plane"),
        }
    }

    /// Writes the uniforms of every sub-surface the planes marked dirty.
    fn upload_dirty(&mut self) {
        let queue = &self.renderer.gfx.queue;

        for (plane, gpu) in self.planes.planes_mut().iter_mut().zip(&mut self.plane_gpu) {
            for index in plane.take_dirty() {
                let (Some(model), Some(binding), Some(sub)) = (
                    plane.sub_surface_world_matrix(index),
                    plane.binding(index),
                    gpu.subs.get_mut(index),
                ) else {
                    continue;
                };

                let uniform = SubSurfaceUniformStd140::new(model, binding);
                queue.write_buffer(&sub.ubo, 0, bytemuck::bytes_of(&uniform));
                sub.has_chunks = !binding.is_empty();
            }
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        match self.planes.synchronize_pending() {
            Ok(report) if report.visited > 0 => log::debug!(
                "Synchronized {} sub-surfaces: {} bound, {} empty, {} truncated",
                report.visited,
                report.populated,
                report.empty,
                report.truncated
            ),
            Ok(_) => {}
            Err(e) => log::error!("Synchronization failed: {}", e),
        }
        self.upload_dirty();

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(&swap_view, &self.plane_gpu, &self.camera);
        frame.present();

        Ok(())
    }
}

fn title(volume: &SyntheticLevelManager, level: u32) -> String {
    format!("Slice Viewer | {}", volume.level_info(level))
}
