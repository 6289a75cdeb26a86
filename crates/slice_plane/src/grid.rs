//! Sub-surface grid builder and the binding-state arena.

use crate::binding::BindingState;
use crate::error::{PlaneError, Result};
use glam::{Vec2, Vec3};

/// Two triangles covering the unit square centered on the origin, in the
/// sub-surface's local XY plane. Shared by every sub-surface of every plane;
/// the per-sub-surface world matrix scales it to the sub-surface edge.
#[rustfmt::skip]
pub const UNIT_QUAD: [[f32; 2]; 6] = [
    [-0.5, -0.5], [0.5, -0.5], [0.5, 0.5],
    [-0.5, -0.5], [0.5, 0.5],  [-0.5, 0.5],
];

/// Number of sub-surface rows and columns of a plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDims {
    pub rows: u32,
    pub cols: u32,
}

impl GridDims {
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    #[inline]
    pub fn count(self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

/// One square patch of the plane. Position is fixed for the grid's lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubSurface {
    pub index: usize,
    pub row: u32,
    pub col: u32,
    /// Center relative to the plane origin, before the plane transform.
    pub local_center: Vec3,
}

/// Geometry shared (read-only) by all sub-surfaces of one plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubSurfaceGeometry {
    pub edge: f32,
}

impl SubSurfaceGeometry {
    /// Corners relative to the sub-surface center, counter-clockwise from bottom-left.
    pub fn corners(&self) -> [Vec3; 4] {
        let h = self.edge * 0.5;
        [
            Vec3::new(-h, -h, 0.0),
            Vec3::new(h, -h, 0.0),
            Vec3::new(h, h, 0.0),
            Vec3::new(-h, h, 0.0),
        ]
    }
}

/// Upper bound on the chunks a square patch of edge `edge` can overlap, for
/// any rotation and translation, when chunks are cubes of edge `chunk_size`.
///
/// A rotated square's bounding box spans at most `edge * √2` on every axis,
/// and an interval of width `w` touches at most `ceil(w / c) + 1` cells.
pub fn chunks_spanned_upper_bound(edge: f32, chunk_size: f32) -> u32 {
    let extent = edge * std::f32::consts::SQRT_2;
    let per_axis = (extent / chunk_size).ceil() as u32 + 1;
    per_axis.pow(3)
}

/// R×C tiling of square sub-surfaces plus one binding state per sub-surface.
///
/// Binding states live in a plain arena indexed like `sub_surfaces`, so a
/// sub-surface index is all the rendering side needs to find its uniforms.
#[derive(Clone, Debug)]
pub struct SubSurfaceGrid {
    dims: GridDims,
    geometry: SubSurfaceGeometry,
    sub_surfaces: Vec<SubSurface>,
    bindings: Vec<BindingState>,
    dirty: Vec<bool>,
}

impl SubSurfaceGrid {
    /// Tiles `dims.rows × dims.cols` squares of edge `chunk_size / 2`,
    /// centered on the local origin, row-major.
    pub fn build(chunk_size: f32, dims: GridDims) -> Result<Self> {
        if dims.rows == 0 || dims.cols == 0 || !chunk_size.is_finite() || chunk_size <= 0.0 {
            return Err(PlaneError::InvalidGridConfiguration {
                rows: dims.rows,
                cols: dims.cols,
                chunk_size,
            });
        }

        let size = chunk_size / 2.0;
        let half_w = dims.cols as f32 * size / 2.0;
        let half_h = dims.rows as f32 * size / 2.0;

        let mut sub_surfaces = Vec::with_capacity(dims.count());
        for j in 0..dims.rows {
            for i in 0..dims.cols {
                sub_surfaces.push(SubSurface {
                    index: sub_surfaces.len(),
                    row: j,
                    col: i,
                    local_center: Vec3::new(
                        -half_w + i as f32 * size + size / 2.0,
                        -half_h + j as f32 * size + size / 2.0,
                        0.0,
                    ),
                });
            }
        }

        log::debug!(
            "Built {}x{} sub-surface grid, edge {:.5}",
            dims.rows,
            dims.cols,
            size
        );

        Ok(Self {
            dims,
            geometry: SubSurfaceGeometry { edge: size },
            bindings: vec![BindingState::placeholder(); sub_surfaces.len()],
            dirty: vec![false; sub_surfaces.len()],
            sub_surfaces,
        })
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sub_surfaces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sub_surfaces.is_empty()
    }

    /// Edge length of one sub-surface in local (unscaled) units.
    #[inline]
    pub fn sub_surface_size(&self) -> f32 {
        self.geometry.edge
    }

    #[inline]
    pub fn geometry(&self) -> &SubSurfaceGeometry {
        &self.geometry
    }

    /// Width × height covered by the whole grid in local units.
    pub fn local_extent(&self) -> Vec2 {
        Vec2::new(self.dims.cols as f32, self.dims.rows as f32) * self.geometry.edge
    }

    pub fn sub_surfaces(&self) -> &[SubSurface] {
        &self.sub_surfaces
    }

    pub fn get(&self, index: usize) -> Option<&SubSurface> {
        self.sub_surfaces.get(index)
    }

    pub fn index_of(&self, row: u32, col: u32) -> Option<usize> {
        (row < self.dims.rows && col < self.dims.cols)
            .then(|| row as usize * self.dims.cols as usize + col as usize)
    }

    /// Local-space rectangle (min, max) covered by a sub-surface.
    pub fn local_rect(&self, index: usize) -> Option<(Vec2, Vec2)> {
        let s = self.sub_surfaces.get(index)?;
        let h = Vec2::splat(self.geometry.edge * 0.5);
        let c = s.local_center.truncate();
        Some((c - h, c + h))
    }

    pub fn bindings(&self) -> &[BindingState] {
        &self.bindings
    }

    pub fn binding(&self, index: usize) -> Option<&BindingState> {
        self.bindings.get(index)
    }

    /// Replaces a binding state wholesale and flags it for the renderer.
    pub(crate) fn write_binding(&mut self, index: usize, state: BindingState) {
        self.bindings[index] = state;
        self.dirty[index] = true;
    }

    #[inline]
    pub fn is_dirty(&self, index: usize) -> bool {
        self.dirty.get(index).copied().unwrap_or(false)
    }

    /// Indices rewritten since the last call, ascending; clears the flags.
    pub fn take_dirty(&mut self) -> Vec<usize> {
        let out: Vec<usize> = self
            .dirty
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.then_some(i))
            .collect();
        self.dirty.iter_mut().for_each(|d| *d = false);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ChunkBinding;

    #[test]
    fn rejects_non_positive_configuration() {
        for (dims, size) in [
            (GridDims::new(0, 4), 1.0),
            (GridDims::new(4, 0), 1.0),
            (GridDims::new(2, 2), 0.0),
            (GridDims::new(2, 2), -1.0),
            (GridDims::new(2, 2), f32::NAN),
        ] {
            let err = SubSurfaceGrid::build(size, dims).unwrap_err();
            assert!(matches!(err, PlaneError::InvalidGridConfiguration { .. }));
        }
    }

    #[test]
    fn two_by_two_layout_matches_formula() {
        let grid = SubSurfaceGrid::build(1.0, GridDims::new(2, 2)).unwrap();
        let centers: Vec<_> = grid.sub_surfaces().iter().map(|s| s.local_center).collect();

        assert_eq!(
            centers,
            vec![
                Vec3::new(-0.25, -0.25, 0.0),
                Vec3::new(0.25, -0.25, 0.0),
                Vec3::new(-0.25, 0.25, 0.0),
                Vec3::new(0.25, 0.25, 0.0),
            ]
        );
        assert_eq!(grid.sub_surface_size(), 0.5);
    }

    #[test]
    fn tiles_without_gaps_or_overlap() {
        for (rows, cols, chunk) in [(1, 1, 1.0), (2, 3, 0.5), (12, 22, 1.0), (7, 5, 0.125)] {
            let grid = SubSurfaceGrid::build(chunk, GridDims::new(rows, cols)).unwrap();
            assert_eq!(grid.len(), (rows * cols) as usize);

            let rects: Vec<_> = (0..grid.len()).map(|i| grid.local_rect(i).unwrap()).collect();

            // Pairwise: interiors never intersect.
            for (a, (amin, amax)) in rects.iter().enumerate() {
                for (bmin, bmax) in rects.iter().skip(a + 1) {
                    let ox = amin.x.max(bmin.x) < amax.x.min(bmax.x) - 1e-6;
                    let oy = amin.y.max(bmin.y) < amax.y.min(bmax.y) - 1e-6;
                    assert!(!(ox && oy), "overlap in {rows}x{cols}");
                }
            }

            // Area and bounds add up to the full extent.
            let area: f32 = rects.iter().map(|(lo, hi)| (*hi - *lo).x * (*hi - *lo).y).sum();
            let extent = grid.local_extent();
            let size = chunk / 2.0;
            assert!((extent.x - cols as f32 * size).abs() < 1e-5);
            assert!((extent.y - rows as f32 * size).abs() < 1e-5);
            assert!((area - extent.x * extent.y).abs() < 1e-4);

            let lo = rects.iter().fold(Vec2::splat(f32::MAX), |m, r| m.min(r.0));
            let hi = rects.iter().fold(Vec2::splat(f32::MIN), |m, r| m.max(r.1));
            assert!((lo + extent * 0.5).abs().max_element() < 1e-5);
            assert!((hi - extent * 0.5).abs().max_element() < 1e-5);
        }
    }

    #[test]
    fn row_major_indexing() {
        let grid = SubSurfaceGrid::build(1.0, GridDims::new(3, 4)).unwrap();
        assert_eq!(grid.index_of(0, 0), Some(0));
        assert_eq!(grid.index_of(1, 2), Some(6));
        assert_eq!(grid.index_of(3, 0), None);
        let s = grid.get(6).unwrap();
        assert_eq!((s.row, s.col, s.index), (1, 2, 6));
    }

    #[test]
    fn starts_with_placeholder_bindings() {
        let grid = SubSurfaceGrid::build(2.0, GridDims::new(2, 3)).unwrap();
        assert!(grid.bindings().iter().all(|b| *b == BindingState::placeholder()));
        assert!((0..grid.len()).all(|i| !grid.is_dirty(i)));
    }

    #[test]
    fn dirty_flags_drain_once() {
        let mut grid = SubSurfaceGrid::build(1.0, GridDims::new(2, 2)).unwrap();
        let state = BindingState::from_chunks(&[ChunkBinding::PLACEHOLDER], 0.5);
        grid.write_binding(3, state);
        grid.write_binding(1, state);

        assert_eq!(grid.take_dirty(), vec![1, 3]);
        assert!(grid.take_dirty().is_empty());
        assert_eq!(grid.binding(3), Some(&state));
    }

    #[test]
    fn half_chunk_patches_touch_at_most_eight_chunks() {
        for chunk in [1.0, 0.5, 0.125, 1.0 / 64.0] {
            assert_eq!(chunks_spanned_upper_bound(chunk / 2.0, chunk), 8);
        }
        // A full-chunk patch would not fit into eight slots.
        assert!(chunks_spanned_upper_bound(1.0, 1.0) > 8);
    }

    #[test]
    fn geometry_corners_span_one_edge() {
        let g = SubSurfaceGeometry { edge: 0.5 };
        let [a, b, c, d] = g.corners();
        assert_eq!(b - a, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(d - a, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(a + c, Vec3::ZERO);
    }
}
