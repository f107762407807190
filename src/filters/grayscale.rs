//! Grayscale conversion filter.
//!
//! Uses ITU-R BT.601 luma coefficients on R, G, B channel order. Output is a
//! single luminance channel; replicating it for display is left to the caller
//! (see [`PixelBuffer::to_rgb`]).

use ndarray::Array2;

use crate::buffer::PixelBuffer;
use crate::error::{FilterError, FilterResult};
use super::core::round_clamp_u8;

/// ITU-R BT.601 luma coefficients
pub const LUMA_R: f32 = 0.299;
pub const LUMA_G: f32 = 0.587;
pub const LUMA_B: f32 = 0.114;

/// Unrounded luminance of one RGB pixel.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32
}

/// Luminance of every pixel as an f32 plane, without rounding.
///
/// Single-channel buffers are taken as-is.
pub fn luminance_plane(buffer: &PixelBuffer) -> Result<Array2<f32>, FilterError> {
    let shape = (buffer.height(), buffer.width());
    match buffer.channels() {
        1 => Ok(Array2::from_shape_fn(shape, |(y, x)| buffer.sample(x, y, 0) as f32)),
        3 => Ok(Array2::from_shape_fn(shape, |(y, x)| {
            luminance(buffer.sample(x, y, 0), buffer.sample(x, y, 1), buffer.sample(x, y, 2))
        })),
        other => Err(FilterError::UnsupportedChannelCount(other)),
    }
}

/// Convert an RGB (or already gray) buffer to a single luminance channel.
///
/// Each sample is `round(0.299 R + 0.587 G + 0.114 B)` clamped to 0-255.
pub fn to_grayscale(buffer: &PixelBuffer) -> FilterResult {
    let samples: Vec<u8> = match buffer.channels() {
        1 => buffer.as_slice().to_vec(),
        3 => buffer
            .as_slice()
            .chunks_exact(3)
            .map(|px| round_clamp_u8(luminance(px[0], px[1], px[2])))
            .collect(),
        other => return Err(FilterError::UnsupportedChannelCount(other)),
    };

    PixelBuffer::new(buffer.width(), buffer.height(), 1, samples)
}
