//! Plane controller: pose, resolution level and world-space queries.

use crate::binding::BindingState;
use crate::error::{PlaneError, Result};
use crate::grid::{GridDims, SubSurfaceGrid};
use crate::provider::ChunkProvider;
use glam::{Mat4, Quat, Vec3};
use std::sync::Arc;

/// Highest `max_level` a plane accepts; `2^-31` is still a normal `f32`.
pub const MAX_LEVEL_LIMIT: u32 = 31;

/// Construction parameters of a [`ProjectionPlane`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneConfig {
    /// Sub-surface rows × columns.
    pub dims: GridDims,
    /// Chunk edge length (world units) at level 0.
    pub chunk_size: f32,
    /// Finest resolution level the level manager serves.
    pub max_level: u32,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            dims: GridDims::new(12, 22),
            chunk_size: 1.0,
            max_level: 6,
        }
    }
}

/// Axis-aligned box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl WorldBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let (min, max) = points.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        Self { min, max }
    }

    /// Closed-interval overlap test; touching boxes intersect.
    pub fn intersects(&self, other: &WorldBounds) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// A cross-section plane made of independently bound sub-surfaces.
///
/// The whole grid is scaled by `2^-level` as one rigid group, so sub-surfaces
/// stay half a chunk wide at every level while the plane keeps its pose.
pub struct ProjectionPlane {
    grid: SubSurfaceGrid,
    level: u32,
    max_level: u32,
    position: Vec3,
    orientation: Quat,
    /// Plane-to-world transform; always current, never deferred to draw time.
    world: Mat4,
    provider: Option<Arc<dyn ChunkProvider>>,
    needs_sync: bool,
}

impl std::fmt::Debug for ProjectionPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionPlane")
            .field("dims", &self.grid.dims())
            .field("level", &self.level)
            .field("position", &self.position)
            .field("orientation", &self.orientation)
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

impl ProjectionPlane {
    pub fn new(config: PlaneConfig) -> Result<Self> {
        if config.max_level > MAX_LEVEL_LIMIT {
            return Err(PlaneError::InvalidMaxLevel {
                max_level: config.max_level,
                limit: MAX_LEVEL_LIMIT,
            });
        }
        let grid = SubSurfaceGrid::build(config.chunk_size, config.dims)?;

        let mut plane = Self {
            grid,
            level: 0,
            max_level: config.max_level,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            world: Mat4::IDENTITY,
            provider: None,
            needs_sync: true,
        };
        plane.update_world();
        Ok(plane)
    }

    /// Binds the level manager queried by `synchronize`. The provider is
    /// shared with the other planes of the scene.
    pub fn attach_chunk_provider(&mut self, provider: Arc<dyn ChunkProvider>) {
        self.provider = Some(provider);
        self.needs_sync = true;
    }

    pub fn has_chunk_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub(crate) fn provider(&self) -> Option<&Arc<dyn ChunkProvider>> {
        self.provider.as_ref()
    }

    // --- Resolution level ---

    /// Rescales the grid to `2^-level` and refreshes world transforms right
    /// away, so chunk queries issued next see the new sub-surface centers.
    ///
    /// Levels past `max_level` are clamped. Returns the level applied.
    pub fn set_resolution_level(&mut self, level: u32) -> u32 {
        let applied = if level > self.max_level {
            log::warn!(
                "Resolution level {} above maximum {}; clamping.",
                level,
                self.max_level
            );
            self.max_level
        } else {
            level
        };

        if applied != self.level {
            log::info!("Projection plane level {} -> {}", self.level, applied);
        }

        self.level = applied;
        self.update_world();
        self.needs_sync = true;
        applied
    }

    #[inline]
    pub fn resolution_level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// `2^-level`.
    #[inline]
    pub fn scale(&self) -> f32 {
        2f32.powi(-(self.level as i32))
    }

    // --- Pose ---

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_world();
        self.needs_sync = true;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.set_position(self.position + delta);
    }

    /// Moves the plane along its own normal (slice scrolling).
    pub fn translate_along_normal(&mut self, distance: f32) {
        self.translate(self.world_normal() * distance);
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
        self.update_world();
        self.needs_sync = true;
    }

    /// Applies `rotation` on top of the current orientation (world frame).
    pub fn rotate(&mut self, rotation: Quat) {
        self.set_orientation(rotation * self.orientation);
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    #[inline]
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    fn update_world(&mut self) {
        self.world =
            Mat4::from_scale_rotation_translation(Vec3::splat(self.scale()), self.orientation, self.position);
    }

    /// True after a level, pose or provider change until the next full pass.
    #[inline]
    pub fn needs_synchronize(&self) -> bool {
        self.needs_sync
    }

    pub(crate) fn mark_synchronized(&mut self) {
        self.needs_sync = false;
    }

    // --- World-space geometry ---

    /// Local +Z in world space.
    pub fn world_normal(&self) -> Vec3 {
        self.world_vector(Vec3::Z)
    }

    /// Local +X in world space.
    pub fn world_basis_u(&self) -> Vec3 {
        self.world_vector(Vec3::X)
    }

    /// Local +Y in world space.
    pub fn world_basis_v(&self) -> Vec3 {
        self.world_vector(Vec3::Y)
    }

    fn world_vector(&self, local: Vec3) -> Vec3 {
        (self.orientation * local).normalize()
    }

    /// `sqrt(rows² + cols²) * scale`, used by the camera framing logic.
    pub fn world_diagonal_extent(&self) -> f32 {
        let dims = self.grid.dims();
        let (r, c) = (dims.rows as f32, dims.cols as f32);
        (r * r + c * c).sqrt() * self.scale()
    }

    pub fn sub_surface_world_center(&self, index: usize) -> Option<Vec3> {
        let s = self.grid.get(index)?;
        Some(self.world.transform_point3(s.local_center))
    }

    /// World centers of all sub-surfaces, row-major.
    pub fn sub_surface_world_centers(&self) -> Vec<Vec3> {
        self.grid
            .sub_surfaces()
            .iter()
            .map(|s| self.world.transform_point3(s.local_center))
            .collect()
    }

    /// Maps the shared unit quad onto the sub-surface in world space.
    pub fn sub_surface_world_matrix(&self, index: usize) -> Option<Mat4> {
        let s = self.grid.get(index)?;
        let edge = self.grid.sub_surface_size();
        Some(
            self.world
                * Mat4::from_translation(s.local_center)
                * Mat4::from_scale(Vec3::new(edge, edge, 1.0)),
        )
    }

    /// World AABB of a sub-surface's footprint.
    pub fn sub_surface_world_bounds(&self, index: usize) -> Option<WorldBounds> {
        let s = self.grid.get(index)?;
        let corners = self
            .grid
            .geometry()
            .corners()
            .map(|c| self.world.transform_point3(s.local_center + c));
        Some(WorldBounds::from_points(&corners))
    }

    /// Where a pick ray meets the (infinite) plane, if in front of `origin`.
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<Vec3> {
        let n = self.world_normal();
        let denom = n.dot(direction);
        if denom.abs() < 1e-8 {
            return None;
        }

        let t = n.dot(self.position - origin) / denom;
        (t >= 0.0).then(|| origin + direction * t)
    }

    // --- Grid access ---

    #[inline]
    pub fn grid(&self) -> &SubSurfaceGrid {
        &self.grid
    }

    pub(crate) fn grid_mut(&mut self) -> &mut SubSurfaceGrid {
        &mut self.grid
    }

    pub fn binding(&self, index: usize) -> Option<&BindingState> {
        self.grid.binding(index)
    }

    pub fn bindings(&self) -> &[BindingState] {
        self.grid.bindings()
    }

    /// Sub-surfaces rewritten since the renderer last looked; clears the flags.
    pub fn take_dirty(&mut self) -> Vec<usize> {
        self.grid.take_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn small_plane() -> ProjectionPlane {
        ProjectionPlane::new(PlaneConfig {
            dims: GridDims::new(4, 6),
            chunk_size: 1.0,
            max_level: 6,
        })
        .unwrap()
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = ProjectionPlane::new(PlaneConfig {
            dims: GridDims::new(0, 3),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, crate::PlaneError::InvalidGridConfiguration { rows: 0, cols: 3, .. }));
    }

    #[test]
    fn level_scales_world_centers_with_pose() {
        let mut plane = small_plane();
        let rot = Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.7, 1.1);
        let pos = Vec3::new(0.5, -0.25, 2.0);
        plane.set_orientation(rot);
        plane.set_position(pos);

        for level in 0..=6 {
            assert_eq!(plane.set_resolution_level(level), level);
            let scale = 1.0 / (1u32 << level) as f32;
            assert_eq!(plane.scale(), scale);

            for s in plane.grid().sub_surfaces() {
                let expected = pos + rot * (s.local_center * scale);
                let got = plane.sub_surface_world_center(s.index).unwrap();
                assert!(approx(got, expected), "level {level}, sub-surface {}", s.index);
            }
        }
    }

    #[test]
    fn max_level_is_bounded() {
        let config = |max_level| PlaneConfig {
            max_level,
            ..PlaneConfig::default()
        };
        let err = ProjectionPlane::new(config(200)).unwrap_err();
        assert_eq!(err, crate::PlaneError::InvalidMaxLevel { max_level: 200, limit: 31 });
        assert!(ProjectionPlane::new(config(u32::MAX)).is_err());

        let mut plane = ProjectionPlane::new(config(MAX_LEVEL_LIMIT)).unwrap();
        assert_eq!(plane.set_resolution_level(u32::MAX), MAX_LEVEL_LIMIT);
        assert!(plane.scale() > 0.0);
        assert!(plane.world_diagonal_extent() > 0.0);
    }

    #[test]
    fn level_is_clamped_to_max() {
        let mut plane = small_plane();
        assert_eq!(plane.set_resolution_level(9), 6);
        assert_eq!(plane.resolution_level(), 6);
        assert_eq!(plane.scale(), 1.0 / 64.0);
    }

    #[test]
    fn basis_follows_orientation() {
        let mut plane = small_plane();
        assert!(approx(plane.world_normal(), Vec3::Z));
        assert!(approx(plane.world_basis_u(), Vec3::X));
        assert!(approx(plane.world_basis_v(), Vec3::Y));

        // Sagittal: rotate +90° about Y, normal becomes +X.
        plane.set_orientation(Quat::from_rotation_y(FRAC_PI_2));
        assert!(approx(plane.world_normal(), Vec3::X));
        assert!(approx(plane.world_basis_u(), -Vec3::Z));
        assert!(approx(plane.world_basis_v(), Vec3::Y));

        let (n, u, v) = (plane.world_normal(), plane.world_basis_u(), plane.world_basis_v());
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!(u.dot(v).abs() < 1e-6 && u.cross(v).dot(n) > 0.999);
    }

    #[test]
    fn diagonal_extent_uses_grid_counts_and_scale() {
        let mut plane = ProjectionPlane::new(PlaneConfig {
            dims: GridDims::new(3, 4),
            chunk_size: 0.25,
            max_level: 6,
        })
        .unwrap();
        assert!((plane.world_diagonal_extent() - 5.0).abs() < 1e-6);
        plane.set_resolution_level(2);
        assert!((plane.world_diagonal_extent() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn pose_changes_request_synchronization() {
        let mut plane = small_plane();
        plane.mark_synchronized();
        assert!(!plane.needs_synchronize());

        plane.translate_along_normal(0.1);
        assert!(plane.needs_synchronize());
        assert!(approx(plane.position(), Vec3::new(0.0, 0.0, 0.1)));

        plane.mark_synchronized();
        plane.set_resolution_level(1);
        assert!(plane.needs_synchronize());
    }

    #[test]
    fn ray_hits_plane_in_front_only() {
        let mut plane = small_plane();
        plane.set_position(Vec3::new(0.0, 0.0, 1.0));

        let hit = plane.intersect_ray(Vec3::new(0.2, 0.3, 5.0), -Vec3::Z).unwrap();
        assert!(approx(hit, Vec3::new(0.2, 0.3, 1.0)));

        assert!(plane.intersect_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::Z).is_none());
        assert!(plane.intersect_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::X).is_none());
    }

    #[test]
    fn world_bounds_and_matrix_agree() {
        let mut plane = small_plane();
        plane.set_resolution_level(1);
        plane.set_position(Vec3::new(1.0, 2.0, 3.0));

        let m = plane.sub_surface_world_matrix(0).unwrap();
        let b = plane.sub_surface_world_bounds(0).unwrap();
        let center = plane.sub_surface_world_center(0).unwrap();

        assert!(approx(m.transform_point3(Vec3::ZERO), center));
        assert!(approx(b.center(), center));
        // Edge 0.5 at level 1 -> 0.25 in world.
        assert!(approx(b.max - b.min, Vec3::new(0.25, 0.25, 0.0)));
        assert!(approx(m.transform_point3(Vec3::new(0.5, 0.5, 0.0)), b.max));
    }

    #[test]
    fn bounds_overlap_is_closed() {
        let a = WorldBounds::new(Vec3::ZERO, Vec3::ONE);
        let b = WorldBounds::new(Vec3::ONE, Vec3::splat(2.0));
        let c = WorldBounds::new(Vec3::splat(1.5), Vec3::splat(3.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(Vec3::splat(0.5)));
    }
}
