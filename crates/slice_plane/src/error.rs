use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlaneError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlaneError {
    /// `synchronize` was called before `attach_chunk_provider`.
    #[error("no chunk provider attached to the projection plane")]
    ProviderUnavailable,

    #[error("invalid grid configuration: {rows}x{cols} sub-surfaces with chunk size {chunk_size}")]
    InvalidGridConfiguration {
        rows: u32,
        cols: u32,
        chunk_size: f32,
    },

    /// Levels past the limit would scale the plane to nothing.
    #[error("max level {max_level} exceeds the supported limit {limit}")]
    InvalidMaxLevel { max_level: u32, limit: u32 },

    #[error("invalid axis descriptor: original size {original_size}, final size {final_size}")]
    InvalidAxis {
        original_size: f64,
        final_size: f64,
    },
}
