//! Convolution engine.
//!
//! Kernels are applied per channel in f32 with reflected border padding, so
//! the output always has the input's dimensions. Weights are applied in
//! correlation orientation (the kernel is not flipped).
//!
//! Separable kernels run as a horizontal pass followed by a vertical pass.
//! Rounding to u8 happens once, after the last pass.

use ndarray::{Array2, ArrayView2};

use super::core::{map_indexed, reflect_index, round_clamp_u8, Kernel};
use crate::buffer::PixelBuffer;
use crate::error::{FilterError, FilterResult};

// ============================================================================
// Plane (f32) primitives
// ============================================================================

/// Direct 2D correlation of a plane with a full kernel.
pub fn correlate_plane(plane: ArrayView2<f32>, kernel: &Kernel) -> Array2<f32> {
    let (height, width) = plane.dim();
    let weights = kernel.weights();
    let (anchor_y, anchor_x) = kernel.anchor();

    map_indexed(height, width, |y, x| {
        let mut sum = 0.0f32;
        for ((ky, kx), &w) in weights.indexed_iter() {
            let sy = reflect_index(y as isize + ky as isize - anchor_y as isize, height);
            let sx = reflect_index(x as isize + kx as isize - anchor_x as isize, width);
            sum += plane[[sy, sx]] * w;
        }
        sum
    })
}

/// Horizontal 1D pass.
pub fn correlate_rows(plane: ArrayView2<f32>, taps: &[f32]) -> Array2<f32> {
    let (height, width) = plane.dim();
    let half = (taps.len() / 2) as isize;

    map_indexed(height, width, |y, x| {
        let mut sum = 0.0f32;
        for (ki, &kv) in taps.iter().enumerate() {
            let sx = reflect_index(x as isize + ki as isize - half, width);
            sum += plane[[y, sx]] * kv;
        }
        sum
    })
}

/// Vertical 1D pass.
pub fn correlate_cols(plane: ArrayView2<f32>, taps: &[f32]) -> Array2<f32> {
    let (height, width) = plane.dim();
    let half = (taps.len() / 2) as isize;

    map_indexed(height, width, |y, x| {
        let mut sum = 0.0f32;
        for (ki, &kv) in taps.iter().enumerate() {
            let sy = reflect_index(y as isize + ki as isize - half, height);
            sum += plane[[sy, x]] * kv;
        }
        sum
    })
}

/// Apply a kernel to a plane, using two 1D passes when the kernel allows it.
pub fn filter_plane(plane: ArrayView2<f32>, kernel: &Kernel) -> Array2<f32> {
    match kernel.separable() {
        Some((column, row)) => {
            let temp = correlate_rows(plane, row);
            correlate_cols(temp.view(), column)
        }
        None => correlate_plane(plane, kernel),
    }
}

// ============================================================================
// Buffer <-> plane conversion
// ============================================================================

/// Extract one channel of a buffer as an f32 plane.
pub fn channel_plane(buffer: &PixelBuffer, channel: usize) -> Array2<f32> {
    Array2::from_shape_fn((buffer.height(), buffer.width()), |(y, x)| {
        buffer.sample(x, y, channel) as f32
    })
}

/// Round, clamp and interleave planes into a new buffer.
pub fn planes_to_buffer(planes: &[Array2<f32>]) -> FilterResult {
    let (height, width) = planes.first().map(|p| p.dim()).ok_or(FilterError::EmptyImage)?;
    let channels = planes.len();

    let mut samples = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        for x in 0..width {
            for plane in planes {
                samples.push(round_clamp_u8(plane[[y, x]]));
            }
        }
    }

    PixelBuffer::new(width, height, channels, samples)
}

// ============================================================================
// Buffer convolution
// ============================================================================

/// Convolve every channel of `buffer` with `kernel`.
///
/// Separable kernels take the two-pass path; the result matches
/// [`convolve_full`] within one intensity level.
pub fn convolve(buffer: &PixelBuffer, kernel: &Kernel) -> FilterResult {
    let planes: Vec<Array2<f32>> = (0..buffer.channels())
        .map(|c| filter_plane(channel_plane(buffer, c).view(), kernel))
        .collect();
    planes_to_buffer(&planes)
}

/// Convolve every channel with the full 2D kernel, ignoring separability.
pub fn convolve_full(buffer: &PixelBuffer, kernel: &Kernel) -> FilterResult {
    let planes: Vec<Array2<f32>> = (0..buffer.channels())
        .map(|c| correlate_plane(channel_plane(buffer, c).view(), kernel))
        .collect();
    planes_to_buffer(&planes)
}
