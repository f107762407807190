//! Error kinds shared by every filter stage.

use thiserror::Error;

use crate::buffer::PixelBuffer;

/// Output of a filter call: a fresh buffer or the reason it could not be produced.
pub type FilterResult = Result<PixelBuffer, FilterError>;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid buffer dimensions {width}x{height}x{channels} for {len} samples")]
    InvalidDimensions {
        width: usize,
        height: usize,
        channels: usize,
        len: usize,
    },

    #[error("Sample ({x}, {y}, channel {channel}) is outside the buffer")]
    OutOfBounds { x: usize, y: usize, channel: usize },

    #[error("Unsupported channel count: {0} (expected 1 or 3)")]
    UnsupportedChannelCount(usize),

    #[error("Unknown filter '{0}'")]
    UnknownFilter(String),

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Invalid kernel: {0}")]
    InvalidKernel(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid filter configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
