//! Canny-style edge detection.
//!
//! Stages:
//! 1. Grayscale conversion
//! 2. Gaussian smoothing (kept in f32)
//! 3. Sobel gradients, magnitude and direction quantized to 0/45/90/135 degrees
//! 4. Non-maximum suppression along the quantized direction
//! 5. Double threshold with hysteresis (8-connected flood from strong edges)
//!
//! Thresholds compare against the raw L2 Sobel magnitude of the smoothed
//! 8-bit luminance, so they mean the same thing for every image. A sharp
//! 0 -> 255 step peaks near 626 after the default smoothing; the largest
//! possible magnitude is about 1442.
//!
//! Output is a single channel of 0 / 255 values with the input's dimensions.
//!
//! ## Borders
//!
//! Every neighbor lookup (smoothing, Sobel, suppression) uses reflected
//! indices, so no stage reads outside the image. A 1x1 image reflects onto
//! itself everywhere, has zero gradient, and yields a single 0 sample.

use std::collections::VecDeque;

use log::trace;
use ndarray::{Array2, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

use super::blur::BlurParams;
use super::convolve::{channel_plane, filter_plane};
use super::core::{map_indexed, reflect_index, Kernel};
use super::grayscale::to_grayscale;
use crate::buffer::PixelBuffer;
use crate::error::{FilterError, FilterResult};

pub const DEFAULT_LOW_THRESHOLD: f32 = 100.0;
pub const DEFAULT_HIGH_THRESHOLD: f32 = 200.0;

/// Largest magnitude below which an image counts as flat.
const MIN_GRADIENT: f32 = 1e-3;

const EDGE: u8 = 255;

/// Edge detector configuration.
///
/// Thresholds apply to the raw Sobel magnitude scale.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeParams {
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub smoothing: BlurParams,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            low_threshold: DEFAULT_LOW_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            smoothing: BlurParams::default(),
        }
    }
}

impl EdgeParams {
    pub fn validate(&self) -> Result<(), FilterError> {
        for (name, value) in [
            ("low_threshold", self.low_threshold),
            ("high_threshold", self.high_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FilterError::InvalidParameter {
                    name,
                    reason: format!("{} must be finite and non-negative", value),
                });
            }
        }
        if self.low_threshold > self.high_threshold {
            return Err(FilterError::InvalidParameter {
                name: "low_threshold",
                reason: format!(
                    "{} exceeds high_threshold {}",
                    self.low_threshold, self.high_threshold
                ),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Gradients
// ============================================================================

/// Gradient direction quantized to one of four bins (image y axis points down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Deg0,
    Deg45,
    Deg90,
    Deg135,
}

impl Direction {
    pub fn from_gradient(gx: f32, gy: f32) -> Self {
        let mut angle = gy.atan2(gx).to_degrees();
        if angle < 0.0 {
            angle += 180.0;
        }

        if !(22.5..157.5).contains(&angle) {
            Direction::Deg0
        } else if angle < 67.5 {
            Direction::Deg45
        } else if angle < 112.5 {
            Direction::Deg90
        } else {
            Direction::Deg135
        }
    }

    /// The two (dx, dy) neighbor offsets along the gradient.
    pub fn neighbor_offsets(self) -> [(isize, isize); 2] {
        match self {
            Direction::Deg0 => [(-1, 0), (1, 0)],
            Direction::Deg45 => [(1, 1), (-1, -1)],
            Direction::Deg90 => [(0, -1), (0, 1)],
            Direction::Deg135 => [(-1, 1), (1, -1)],
        }
    }
}

/// Sobel derivatives and magnitude of a plane.
pub struct Gradients {
    pub gx: Array2<f32>,
    pub gy: Array2<f32>,
    pub magnitude: Array2<f32>,
}

impl Gradients {
    pub fn direction(&self, x: usize, y: usize) -> Direction {
        Direction::from_gradient(self.gx[[y, x]], self.gy[[y, x]])
    }
}

/// Compute Sobel gradients with reflected borders.
pub fn gradients(plane: ArrayView2<f32>) -> Gradients {
    let gx = filter_plane(plane, &Kernel::sobel_x());
    let gy = filter_plane(plane, &Kernel::sobel_y());
    let magnitude = Zip::from(&gx).and(&gy).map_collect(|&a, &b| (a * a + b * b).sqrt());

    Gradients { gx, gy, magnitude }
}

/// True when no magnitude reaches [`MIN_GRADIENT`].
pub fn is_flat(magnitude: ArrayView2<f32>) -> bool {
    magnitude.fold(0.0f32, |acc, &m| acc.max(m)) < MIN_GRADIENT
}

// ============================================================================
// Non-maximum suppression
// ============================================================================

/// Keep a magnitude only where it is >= both neighbors along its direction.
pub fn non_maximum_suppression(grad: &Gradients) -> Array2<f32> {
    let (height, width) = grad.magnitude.dim();
    let magnitude = &grad.magnitude;

    map_indexed(height, width, |y, x| {
        let m = magnitude[[y, x]];
        if m <= 0.0 {
            return 0.0;
        }

        let is_peak = grad.direction(x, y).neighbor_offsets().iter().all(|&(dx, dy)| {
            let nx = reflect_index(x as isize + dx, width);
            let ny = reflect_index(y as isize + dy, height);
            m >= magnitude[[ny, nx]]
        });

        if is_peak {
            m
        } else {
            0.0
        }
    })
}

// ============================================================================
// Hysteresis
// ============================================================================

/// Double-threshold classification with hysteresis.
///
/// Pixels >= `high` are strong edges. Pixels in [`low`, `high`) become edges
/// only when 8-connected, directly or through other such pixels, to a strong
/// edge. Zero magnitudes are never edges.
pub fn hysteresis(suppressed: ArrayView2<f32>, low: f32, high: f32) -> Array2<u8> {
    let (height, width) = suppressed.dim();
    let mut edges = Array2::<u8>::zeros((height, width));
    let mut queue = VecDeque::new();

    for ((y, x), &m) in suppressed.indexed_iter() {
        if m > 0.0 && m >= high {
            edges[[y, x]] = EDGE;
            queue.push_back((y, x));
        }
    }
    let strong = queue.len();
    let mut promoted = 0usize;

    while let Some((y, x)) = queue.pop_front() {
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let ny = y as isize + dy;
                let nx = x as isize + dx;
                if ny < 0 || nx < 0 || ny >= height as isize || nx >= width as isize {
                    continue;
                }
                let (ny, nx) = (ny as usize, nx as usize);

                let m = suppressed[[ny, nx]];
                if edges[[ny, nx]] == 0 && m > 0.0 && m >= low {
                    edges[[ny, nx]] = EDGE;
                    promoted += 1;
                    queue.push_back((ny, nx));
                }
            }
        }
    }

    trace!("hysteresis: {} strong, {} weak promoted", strong, promoted);
    edges
}

// ============================================================================
// Detector
// ============================================================================

/// Detect edges in a grayscale or RGB buffer.
///
/// # Arguments
/// * `buffer` - 1- or 3-channel image
/// * `params` - Thresholds (raw Sobel magnitude scale) and smoothing kernel
///
/// # Returns
/// Single-channel buffer of 0 / 255 values, same width and height
pub fn detect_edges(buffer: &PixelBuffer, params: &EdgeParams) -> FilterResult {
    params.validate()?;
    let kernel = params.smoothing.kernel()?;

    let gray = to_grayscale(buffer)?;
    let smoothed = filter_plane(channel_plane(&gray, 0).view(), &kernel);

    let grad = gradients(smoothed.view());
    let edges = if is_flat(grad.magnitude.view()) {
        trace!("edge detection: no gradient in {}x{} image", gray.width(), gray.height());
        Array2::zeros((gray.height(), gray.width()))
    } else {
        let suppressed = non_maximum_suppression(&grad);
        hysteresis(suppressed.view(), params.low_threshold, params.high_threshold)
    };

    PixelBuffer::from_array(edges.insert_axis(Axis(2)))
}
