//! Voxel ↔ unit coordinate transforms.
//!
//! The volume is normalized into "unit" space where each axis may have been
//! padded (`final_size ≥ original_size`), shifted by `offset` voxels and
//! flipped. Both directions are exact inverses of each other.

use crate::error::{PlaneError, Result};
use glam::DVec3;

/// How one volume axis maps between voxel indices and unit space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisDescriptor {
    /// Voxel count of the source data along this axis.
    pub original_size: f64,
    /// Voxel count after padding to the chunked pyramid.
    pub final_size: f64,
    /// Padding before the data, in voxels.
    pub offset: f64,
    /// Axis direction is flipped between voxel and unit space.
    pub reversed: bool,
}

impl AxisDescriptor {
    /// Checked constructor; both sizes must be finite and positive.
    pub fn new(original_size: f64, final_size: f64, offset: f64, reversed: bool) -> Result<Self> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(original_size) || !ok(final_size) {
            return Err(PlaneError::InvalidAxis {
                original_size,
                final_size,
            });
        }

        Ok(Self {
            original_size,
            final_size,
            offset,
            reversed,
        })
    }

    /// Identity-like axis: no padding, no offset, not reversed.
    /// `size` must be finite and positive, as in [`AxisDescriptor::new`].
    pub fn unpadded(size: f64) -> Self {
        debug_assert!(
            size.is_finite() && size > 0.0,
            "unpadded axis needs a positive size, got {size}"
        );
        Self {
            original_size: size,
            final_size: size,
            offset: 0.0,
            reversed: false,
        }
    }

    #[inline]
    fn ratio(&self) -> f64 {
        self.original_size / self.final_size
    }

    #[inline]
    fn unit_offset(&self) -> f64 {
        self.offset / self.final_size
    }

    pub fn unit_to_voxel(&self, unit: f64) -> f64 {
        let mut v = (unit - self.unit_offset()) / self.ratio();
        if self.reversed {
            v = 1.0 - v;
        }
        v * self.original_size
    }

    pub fn voxel_to_unit(&self, voxel: f64) -> f64 {
        let mut u = voxel / self.original_size;
        if self.reversed {
            u = 1.0 - u;
        }
        u * self.ratio() + self.unit_offset()
    }
}

/// Per-axis descriptors of a volume, for converting whole positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeAxes {
    pub x: AxisDescriptor,
    pub y: AxisDescriptor,
    pub z: AxisDescriptor,
}

impl VolumeAxes {
    pub fn unit_to_voxel(&self, unit: DVec3) -> DVec3 {
        DVec3::new(
            self.x.unit_to_voxel(unit.x),
            self.y.unit_to_voxel(unit.y),
            self.z.unit_to_voxel(unit.z),
        )
    }

    pub fn voxel_to_unit(&self, voxel: DVec3) -> DVec3 {
        DVec3::new(
            self.x.voxel_to_unit(voxel.x),
            self.y.voxel_to_unit(voxel.y),
            self.z.voxel_to_unit(voxel.z),
        )
    }
}
