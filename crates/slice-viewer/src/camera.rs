use crate::data::types::FrameUniformStd140 as FrameUniform;
use glam::{Mat4, Vec2, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// World "up" of the volume (superior direction).
const WORLD_UP: Vec3 = Vec3::Z;

#[derive(Debug, Clone)]
pub struct Camera {
    // --- Orbital Parameters (Primary State) ---
    /// The world point the camera orbits around.
    pub target: Vec3,
    /// Distance from the camera to the target.
    pub radius: f32,
    /// Azimuth angle around the world up axis (radians).
    pub azimuth_rad: f32,
    /// Elevation angle above the XY plane (radians).
    pub elevation_rad: f32,

    // --- Derived Properties (Updated by `update()`) ---
    position: Vec3,

    // --- Projection Parameters ---
    pub fov_y_rad: f32,
    pub aspect: f32,
}

impl Camera {
    /// Creates a new orbital camera looking at `target`.
    pub fn new(target: Vec3, radius: f32, aspect: f32) -> Self {
        let mut camera = Self {
            target,
            radius,
            azimuth_rad: -60.0f32.to_radians(),
            elevation_rad: 25.0f32.to_radians(),
            position: Vec3::ZERO, // placeholder
            fov_y_rad: 45.0f32.to_radians(),
            aspect,
        };

        camera.update(); // Calculate initial position
        camera
    }

    /// Recalculates the camera position from its orbital parameters.
    /// This must be called after any orbital parameter changes.
    pub fn update(&mut self) {
        let (sin_az, cos_az) = self.azimuth_rad.sin_cos();
        let (sin_el, cos_el) = self.elevation_rad.sin_cos();
        let offset = Vec3::new(cos_el * cos_az, cos_el * sin_az, sin_el) * self.radius;
        self.position = self.target + offset;
    }

    /// Frames an object of the given world diagonal so it fits the vertical field of view.
    pub fn frame_extent(&mut self, target: Vec3, diagonal: f32) {
        self.target = target;
        self.radius = (diagonal * 0.5 / (self.fov_y_rad * 0.5).tan()).max(1e-3);
        self.update();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, WORLD_UP)
    }

    /// wgpu clip space (depth in [0, 1]); glam's `perspective_rh` already targets it.
    pub fn proj(&self) -> Mat4 {
        let near = (self.radius * 1e-3).max(1e-5);
        let far = self.radius * 100.0;
        Mat4::perspective_rh(self.fov_y_rad, self.aspect, near, far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    pub fn make_frame_uniform(&self) -> FrameUniform {
        FrameUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
        }
    }

    /// World-space pick ray through a point in normalized device coordinates.
    /// Returns (origin on the near plane, unit direction).
    pub fn ray_through_ndc(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let inv = self.view_proj().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        (near, (far - near).normalize())
    }
}

pub struct CameraController {
    mouse_down: bool,
    last_mouse: Option<(f64, f64)>,
}

impl CameraController {
    /// Creates a new controller with default state.
    pub fn new() -> Self {
        Self {
            mouse_down: false,
            last_mouse: None,
        }
    }

    /// Handles window events and updates the camera.
    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut Camera) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    self.mouse_down = *state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor_orbit((position.x, position.y), camera);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };

                self.handle_scroll(scroll, camera);
            }
            _ => {}
        }
    }

    /// Adjusts camera orbit radius based on scroll input.
    fn handle_scroll(&mut self, delta: f32, camera: &mut Camera) {
        // Positive delta = scroll up = zoom in = decrease radius.
        let zoom = 1.1_f32.powf(-delta);
        camera.radius = (camera.radius * zoom).clamp(1e-3, 1_000.0);
        camera.update();
    }

    /// Rotates the camera around the target while the left mouse button is held.
    fn handle_cursor_orbit(&mut self, xy: (f64, f64), camera: &mut Camera) {
        if let Some(last) = self.last_mouse {
            if self.mouse_down {
                let dx = ((xy.0 - last.0) * 0.005) as f32;
                let dy = ((last.1 - xy.1) * 0.005) as f32;

                camera.azimuth_rad -= dx;
                camera.elevation_rad -= dy;

                // Keep away from the poles so `look_at` stays well defined.
                camera.elevation_rad = camera
                    .elevation_rad
                    .clamp(-89.0f32.to_radians(), 89.0f32.to_radians());

                camera.update();
            }
        }
        self.last_mouse = Some(xy);
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_at_target() {
        let camera = Camera::new(Vec3::new(0.5, 0.5, 0.5), 3.0, 16.0 / 9.0);
        let (origin, dir) = camera.ray_through_ndc(Vec2::ZERO);

        let to_target = (camera.target - origin).normalize();
        assert!(dir.dot(to_target) > 0.9999);
        assert!(((camera.position() - camera.target).length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn framing_fits_diagonal() {
        let mut camera = Camera::new(Vec3::ZERO, 1.0, 1.0);
        camera.frame_extent(Vec3::ONE, 2.0);
        let half_fov = camera.fov_y_rad * 0.5;
        assert!((camera.radius * half_fov.tan() - 1.0).abs() < 1e-5);
        assert_eq!(camera.target, Vec3::ONE);
    }
}
