//! The three orthogonal projection planes that make up the slice view.

use glam::{DVec3, Quat, Vec3};
use slice_plane::{ChunkProvider, PlaneConfig, ProjectionPlane, SyncReport, VolumeAxes};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

/// Which anatomical cross-section a plane shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceAxis {
    /// Normal +Z.
    Axial,
    /// Normal +Y.
    Coronal,
    /// Normal +X.
    Sagittal,
}

impl SliceAxis {
    pub const ALL: [SliceAxis; 3] = [SliceAxis::Axial, SliceAxis::Coronal, SliceAxis::Sagittal];

    /// Orientation taking the plane's local +Z onto this axis' normal.
    pub fn base_orientation(self) -> Quat {
        match self {
            SliceAxis::Axial => Quat::IDENTITY,
            SliceAxis::Coronal => Quat::from_rotation_x(-FRAC_PI_2),
            SliceAxis::Sagittal => Quat::from_rotation_y(FRAC_PI_2),
        }
    }
}

impl std::fmt::Display for SliceAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SliceAxis::Axial => "axial",
            SliceAxis::Coronal => "coronal",
            SliceAxis::Sagittal => "sagittal",
        };

        f.write_str(s)
    }
}

/// Three mutually orthogonal planes sharing a center, a rotation and a level.
pub struct OrthoPlanes {
    planes: [ProjectionPlane; 3],
    center: Vec3,
    rotation: Quat,
}

impl OrthoPlanes {
    pub fn new(config: PlaneConfig, provider: Arc<dyn ChunkProvider>) -> slice_plane::Result<Self> {
        let mut planes = [
            ProjectionPlane::new(config)?,
            ProjectionPlane::new(config)?,
            ProjectionPlane::new(config)?,
        ];
        for (plane, axis) in planes.iter_mut().zip(SliceAxis::ALL) {
            plane.set_orientation(axis.base_orientation());
            plane.attach_chunk_provider(provider.clone());
        }

        Ok(Self {
            planes,
            center: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        })
    }

    pub fn plane(&self, axis: SliceAxis) -> &ProjectionPlane {
        &self.planes[axis as usize]
    }

    pub fn planes(&self) -> &[ProjectionPlane; 3] {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut [ProjectionPlane; 3] {
        &mut self.planes
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.planes[0].resolution_level()
    }

    /// Applies a level to all three planes; returns the level actually applied.
    pub fn set_level(&mut self, level: u32) -> u32 {
        let mut applied = level;
        for plane in &mut self.planes {
            applied = plane.set_resolution_level(level);
        }
        applied
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
        for plane in &mut self.planes {
            plane.set_position(center);
        }
    }

    /// Shifts the shared center, expressed in the rotated frame of the set.
    pub fn nudge(&mut self, local_delta: Vec3) {
        self.set_center(self.center + self.rotation * local_delta);
    }

    /// Sets the absolute rotation of the set; identity restores the
    /// axis-aligned axial, coronal and sagittal planes.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        for (plane, axis) in self.planes.iter_mut().zip(SliceAxis::ALL) {
            plane.set_orientation(self.rotation * axis.base_orientation());
        }
    }

    /// Rotates the whole set about its center.
    pub fn rotate(&mut self, rotation: Quat) {
        self.set_rotation(rotation * self.rotation);
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Largest world diagonal of the three planes.
    pub fn world_diagonal_extent(&self) -> f32 {
        self.planes
            .iter()
            .map(ProjectionPlane::world_diagonal_extent)
            .fold(0.0, f32::max)
    }

    pub fn needs_synchronize(&self) -> bool {
        self.planes.iter().any(ProjectionPlane::needs_synchronize)
    }

    /// Fully resynchronizes every plane that changed since its last pass.
    pub fn synchronize_pending(&mut self) -> slice_plane::Result<SyncReport> {
        let mut total = SyncReport::default();
        for (plane, axis) in self.planes.iter_mut().zip(SliceAxis::ALL) {
            if !plane.needs_synchronize() {
                continue;
            }
            let r = plane.synchronize()?;
            log::debug!("{} plane: {} of {} sub-surfaces bound", axis, r.populated, r.visited);
            total.visited += r.visited;
            total.populated += r.populated;
            total.empty += r.empty;
            total.truncated += r.truncated;
        }
        Ok(total)
    }

    /// First plane hit by a pick ray, with the world hit point.
    ///
    /// Only hits within the plane's rectangle count; the closest wins.
    pub fn pick(&self, origin: Vec3, direction: Vec3) -> Option<(SliceAxis, Vec3)> {
        SliceAxis::ALL
            .into_iter()
            .filter_map(|axis| {
                let plane = self.plane(axis);
                let hit = plane.intersect_ray(origin, direction)?;
                let local = plane.world_matrix().inverse().transform_point3(hit);
                let half = plane.grid().local_extent() * 0.5;
                (local.x.abs() <= half.x && local.y.abs() <= half.y).then_some((axis, hit))
            })
            .min_by(|a, b| {
                a.1.distance_squared(origin)
                    .total_cmp(&b.1.distance_squared(origin))
            })
    }
}

/// Placement of the volume's unit cube in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeFrame {
    pub axes: VolumeAxes,
    /// World position of unit coordinate (0, 0, 0).
    pub origin: Vec3,
    /// World edge length of the unit cube.
    pub extent: f32,
}

impl VolumeFrame {
    pub fn voxel_to_world(&self, voxel: DVec3) -> Vec3 {
        self.origin + self.axes.voxel_to_unit(voxel).as_vec3() * self.extent
    }

    pub fn world_to_voxel(&self, world: Vec3) -> DVec3 {
        self.axes
            .unit_to_voxel(((world - self.origin) / self.extent).as_dvec3())
    }

    /// Half-open containment in voxel space.
    pub fn contains_voxel(&self, voxel: DVec3) -> bool {
        let size = DVec3::new(
            self.axes.x.original_size,
            self.axes.y.original_size,
            self.axes.z.original_size,
        );
        voxel.cmpge(DVec3::ZERO).all() && voxel.cmplt(size).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticLevelManager;
    use slice_plane::{AxisDescriptor, GridDims};

    fn scene() -> OrthoPlanes {
        let provider = Arc::new(SyntheticLevelManager::new(Vec3::ZERO, 1.0, 1.0, 6).unwrap());
        OrthoPlanes::new(
            PlaneConfig {
                dims: GridDims::new(4, 4),
                chunk_size: 1.0,
                max_level: 6,
            },
            provider,
        )
        .unwrap()
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn planes_are_mutually_orthogonal() {
        let s = scene();
        let n: Vec<Vec3> = SliceAxis::ALL.iter().map(|a| s.plane(*a).world_normal()).collect();
        assert!(approx(n[0], Vec3::Z));
        assert!(approx(n[1], Vec3::Y));
        assert!(approx(n[2], Vec3::X));
    }

    #[test]
    fn rotation_keeps_orthogonality() {
        let mut s = scene();
        s.rotate(Quat::from_rotation_z(0.3));
        s.rotate(Quat::from_rotation_x(-0.2));
        let n: Vec<Vec3> = s.planes().iter().map(|p| p.world_normal()).collect();
        assert!(n[0].dot(n[1]).abs() < 1e-5);
        assert!(n[1].dot(n[2]).abs() < 1e-5);
        assert!(n[0].dot(n[2]).abs() < 1e-5);
    }

    #[test]
    fn level_and_center_apply_to_all_planes() {
        let mut s = scene();
        assert_eq!(s.set_level(10), 6);
        s.set_center(Vec3::splat(0.5));
        for p in s.planes() {
            assert_eq!(p.resolution_level(), 6);
            assert!(approx(p.position(), Vec3::splat(0.5)));
        }
        assert!((s.world_diagonal_extent() - 32f32.sqrt() / 64.0).abs() < 1e-6);
    }

    #[test]
    fn pending_sync_runs_once() {
        let mut s = scene();
        s.set_center(Vec3::splat(0.5));
        assert!(s.needs_synchronize());

        let report = s.synchronize_pending().unwrap();
        assert_eq!(report.visited, 48);
        assert!(report.populated > 0);
        assert!(!s.needs_synchronize());

        assert_eq!(s.synchronize_pending().unwrap().visited, 0);

        s.nudge(Vec3::new(0.0, 0.0, 0.1));
        assert!(s.needs_synchronize());
    }

    #[test]
    fn pick_prefers_nearest_plane() {
        let mut s = scene();
        s.set_center(Vec3::splat(0.5));

        // Straight down onto the axial plane, off the other two planes' lines.
        let hit = s.pick(Vec3::new(0.7, 0.8, 3.0), -Vec3::Z).unwrap();
        assert_eq!(hit.0, SliceAxis::Axial);
        assert!(approx(hit.1, Vec3::new(0.7, 0.8, 0.5)));

        // Outside every rectangle.
        assert!(s.pick(Vec3::new(9.0, 9.0, 3.0), -Vec3::Z).is_none());
    }

    #[test]
    fn absolute_rotation_replaces_accumulated_rotation() {
        let mut s = scene();
        s.rotate(Quat::from_rotation_z(0.4));
        s.rotate(Quat::from_rotation_x(0.4));

        let target = Quat::from_rotation_y(0.25);
        s.set_rotation(target);
        assert!(s.rotation().dot(target).abs() > 1.0 - 1e-6);
        assert!(approx(s.plane(SliceAxis::Axial).world_normal(), target * Vec3::Z));
        assert!(s.needs_synchronize());

        s.set_rotation(Quat::IDENTITY);
        assert!(approx(s.plane(SliceAxis::Axial).world_normal(), Vec3::Z));
        assert!(approx(s.plane(SliceAxis::Coronal).world_normal(), Vec3::Y));
        assert!(approx(s.plane(SliceAxis::Sagittal).world_normal(), Vec3::X));
    }

    fn frame() -> VolumeFrame {
        // 100x80x60 voxels padded into a 128³ cube, data centered.
        VolumeFrame {
            axes: VolumeAxes {
                x: AxisDescriptor::new(100.0, 128.0, 14.0, false).unwrap(),
                y: AxisDescriptor::new(80.0, 128.0, 24.0, false).unwrap(),
                z: AxisDescriptor::new(60.0, 128.0, 34.0, false).unwrap(),
            },
            origin: Vec3::new(1.0, 0.0, 0.0),
            extent: 2.0,
        }
    }

    #[test]
    fn voxel_position_maps_into_world() {
        let f = frame();
        // Data center sits at the center of the padded cube.
        let center = f.voxel_to_world(DVec3::new(50.0, 40.0, 30.0));
        assert!(approx(center, Vec3::new(2.0, 1.0, 1.0)));

        let corner = f.voxel_to_world(DVec3::ZERO);
        assert!(approx(corner, Vec3::new(1.0 + 2.0 * 14.0 / 128.0, 2.0 * 24.0 / 128.0, 2.0 * 34.0 / 128.0)));

        let back = f.world_to_voxel(f.voxel_to_world(DVec3::new(12.5, 70.0, 3.0)));
        assert!((back - DVec3::new(12.5, 70.0, 3.0)).abs().max_element() < 1e-3);
        assert!(f.contains_voxel(back));
        assert!(!f.contains_voxel(DVec3::new(100.0, 0.0, 0.0)));
    }

    #[test]
    fn planes_jump_to_voxel_position() {
        let mut s = scene();
        let f = VolumeFrame {
            origin: Vec3::ZERO,
            extent: 1.0,
            ..frame()
        };
        s.set_center(f.voxel_to_world(DVec3::new(50.0, 40.0, 30.0)));
        for p in s.planes() {
            assert!(approx(p.position(), Vec3::splat(0.5)));
        }
    }
}
