use clap::Parser;
use glam::{DVec3, UVec3};
use slice_plane::{AxisDescriptor, GridDims, PlaneConfig, VolumeAxes};
use std::{fmt, str::FromStr};

/// `slice_viewer` - orthogonal slice planes through a multi-resolution volume.
///
/// The volume occupies the unit cube in world space. At level `L` it is
/// served as cubic chunks of edge `chunk_size / 2^L`.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Sub-surface rows of every plane.
    #[arg(long, env = "SLICE_VIEWER_ROWS", default_value_t = 12)]
    pub rows: u32,

    /// Sub-surface columns of every plane.
    #[arg(long, env = "SLICE_VIEWER_COLS", default_value_t = 22)]
    pub cols: u32,

    /// Level-0 chunk edge in world units; also the level-0 sub-surface edge.
    #[arg(
        long,
        env = "SLICE_VIEWER_CHUNK_SIZE",
        default_value_t = 1.0,
        value_parser = parse_chunk_size
    )]
    pub chunk_size: f32,

    /// Finest resolution level served by the level manager.
    #[arg(
        long,
        env = "SLICE_VIEWER_MAX_LEVEL",
        default_value_t = 6,
        value_parser = clap::value_parser!(u32).range(0..=10)
    )]
    pub max_level: u32,

    /// Level the planes start at; clamped to `max_level`.
    #[arg(long, env = "SLICE_VIEWER_LEVEL", default_value_t = 0)]
    pub level: u32,

    /// Voxel dimensions of the volume, `XxYxZ`.
    #[arg(long, env = "SLICE_VIEWER_VOLUME", default_value = "512x512x256")]
    pub volume: VolumeSize,

    /// Voxel the planes start centered on, `X,Y,Z`; `G` jumps back to it.
    #[arg(long, env = "SLICE_VIEWER_GOTO_VOXEL")]
    pub goto_voxel: Option<VoxelPosition>,

    #[arg(long, env = "SLICE_VIEWER_WIDTH", default_value_t = 1280)]
    pub width: u32,

    #[arg(long, env = "SLICE_VIEWER_HEIGHT", default_value_t = 720)]
    pub height: u32,

    /// Present without waiting for vertical sync.
    #[arg(long, env = "SLICE_VIEWER_NO_VSYNC")]
    pub no_vsync: bool,
}

impl Config {
    pub fn plane_config(&self) -> PlaneConfig {
        PlaneConfig {
            dims: GridDims::new(self.rows, self.cols),
            chunk_size: self.chunk_size,
            max_level: self.max_level,
        }
    }

    /// Axis transforms of the volume as stored: every axis padded to the
    /// next power of two of the largest dimension, data centered in it.
    pub fn volume_axes(&self) -> slice_plane::Result<VolumeAxes> {
        let padded = self.volume.0.max_element().next_power_of_two() as f64;
        let axis = |voxels: u32| {
            let original = voxels as f64;
            AxisDescriptor::new(original, padded, (padded - original) * 0.5, false)
        };

        Ok(VolumeAxes {
            x: axis(self.volume.0.x)?,
            y: axis(self.volume.0.y)?,
            z: axis(self.volume.0.z)?,
        })
    }
}

/// Voxel dimensions parsed from `XxYxZ`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolumeSize(pub UVec3);

impl FromStr for VolumeSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dims = s
            .split(['x', 'X'])
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid volume size '{s}': {e}"))?;

        match dims.as_slice() {
            &[x, y, z] if x > 0 && y > 0 && z > 0 => Ok(Self(UVec3::new(x, y, z))),
            _ => Err(format!("volume size '{s}' must be three positive integers, e.g. 512x512x256")),
        }
    }
}

impl fmt::Display for VolumeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.0.x, self.0.y, self.0.z)
    }
}

fn parse_chunk_size(s: &str) -> Result<f32, String> {
    let v: f32 = s.trim().parse().map_err(|e| format!("invalid chunk size '{s}': {e}"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("chunk size must be positive, got {v}"))
    }
}

/// Voxel coordinates parsed from `X,Y,Z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelPosition(pub DVec3);

impl FromStr for VoxelPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coords = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid voxel position '{s}': {e}"))?;

        match coords.as_slice() {
            &[x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => {
                Ok(Self(DVec3::new(x, y, z)))
            }
            _ => Err(format!("voxel position '{s}' must be three numbers, e.g. 50,40,30")),
        }
    }
}
