//! Core utilities shared by the filters.
//!
//! This module provides:
//! - The `Kernel` weight matrix (with optional separable factors)
//! - Gaussian kernel generation
//! - Reflected border indexing
//! - Per-pixel plane evaluation (parallel with the `parallel` feature)

use ndarray::{Array2, Zip};

use crate::error::FilterError;

/// Reflect index for border handling (scipy 'reflect' mode).
///
/// `d c b a | a b c d | d c b a` - the edge sample is repeated, so a 1-pixel
/// wide axis maps every index to 0.
#[inline]
pub fn reflect_index(i: isize, size: usize) -> usize {
    let s = size as isize;
    let period = 2 * s;
    let m = i.rem_euclid(period);
    if m < s {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Round to nearest and clamp into the u8 range.
#[inline]
pub fn round_clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Evaluate `f(y, x)` for every sample of a `height x width` plane.
pub(crate) fn map_indexed<F>(height: usize, width: usize, f: F) -> Array2<f32>
where
    F: Fn(usize, usize) -> f32 + Sync + Send,
{
    let mut out = Array2::<f32>::zeros((height, width));

    #[cfg(feature = "parallel")]
    Zip::indexed(&mut out).par_for_each(|(y, x), v| *v = f(y, x));

    #[cfg(not(feature = "parallel"))]
    Zip::indexed(&mut out).for_each(|(y, x), v| *v = f(y, x));

    out
}

/// Largest Gaussian kernel side accepted from callers.
pub const MAX_KERNEL_SIZE: usize = 1023;

/// Sigma used when a Gaussian is requested by size only.
///
/// Matches the usual 8-bit convention: 3 -> 0.8, 5 -> 1.1, 7 -> 1.4.
pub fn sigma_for_size(size: usize) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Kernel size used when a Gaussian is requested by sigma only (6 sigma, odd).
///
/// `None` when the derived size exceeds [`MAX_KERNEL_SIZE`].
pub fn size_for_sigma(sigma: f32) -> Option<usize> {
    let side = (sigma * 6.0).ceil();
    if side > MAX_KERNEL_SIZE as f32 {
        return None;
    }
    Some((side as usize) | 1).filter(|&size| size <= MAX_KERNEL_SIZE)
}

/// Generate a normalized 1D Gaussian kernel of the given odd size.
pub fn gaussian_kernel_1d(size: usize, sigma: f32) -> Vec<f32> {
    let half = (size / 2) as f32;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    // Normalize
    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }

    kernel
}

/// A small 2D weight matrix anchored at its center.
///
/// Rows index y, columns index x. When the kernel is the outer product of a
/// column and a row vector it keeps both factors so it can be applied in two
/// 1D passes.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    weights: Array2<f32>,
    separable: Option<(Vec<f32>, Vec<f32>)>,
}

impl Kernel {
    /// Build a kernel from a full weight matrix. Both dimensions must be odd.
    pub fn new(weights: Array2<f32>) -> Result<Self, FilterError> {
        let (rows, cols) = weights.dim();
        if rows % 2 == 0 || cols % 2 == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "dimensions {}x{} must be odd",
                rows, cols
            )));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(FilterError::InvalidKernel("weights must be finite".to_string()));
        }
        Ok(Self {
            weights,
            separable: None,
        })
    }

    /// Build a kernel from its vertical (column) and horizontal (row) factors.
    pub fn from_separable(column: Vec<f32>, row: Vec<f32>) -> Result<Self, FilterError> {
        if column.is_empty() || row.is_empty() {
            return Err(FilterError::InvalidKernel("factors must not be empty".to_string()));
        }
        let weights = Array2::from_shape_fn((column.len(), row.len()), |(y, x)| column[y] * row[x]);
        let mut kernel = Self::new(weights)?;
        kernel.separable = Some((column, row));
        Ok(kernel)
    }

    /// 1x1 kernel with weight 1.0.
    pub fn identity() -> Self {
        Self {
            weights: Array2::from_elem((1, 1), 1.0),
            separable: Some((vec![1.0], vec![1.0])),
        }
    }

    /// Gaussian blur kernel.
    ///
    /// # Arguments
    /// * `size` - Odd kernel size up to [`MAX_KERNEL_SIZE`]; 0 derives it from `sigma`
    /// * `sigma` - Standard deviation; <= 0 derives it from `size`
    pub fn gaussian(size: usize, sigma: f32) -> Result<Self, FilterError> {
        if !sigma.is_finite() {
            return Err(FilterError::InvalidParameter {
                name: "sigma",
                reason: format!("{} is not finite", sigma),
            });
        }
        // sigma^2 must not underflow or the center weight becomes 0/0
        if sigma > 0.0 && sigma * sigma < f32::MIN_POSITIVE {
            return Err(FilterError::InvalidParameter {
                name: "sigma",
                reason: format!("{} is too small", sigma),
            });
        }
        if size > MAX_KERNEL_SIZE {
            return Err(FilterError::InvalidParameter {
                name: "kernel_size",
                reason: format!("{} exceeds the maximum of {}", size, MAX_KERNEL_SIZE),
            });
        }
        let size = match (size, sigma > 0.0) {
            (0, true) => size_for_sigma(sigma).ok_or_else(|| FilterError::InvalidParameter {
                name: "sigma",
                reason: format!("{} needs a kernel larger than {}", sigma, MAX_KERNEL_SIZE),
            })?,
            (0, false) => {
                return Err(FilterError::InvalidParameter {
                    name: "kernel_size",
                    reason: "either kernel_size or sigma must be positive".to_string(),
                })
            }
            (s, _) if s % 2 == 0 => {
                return Err(FilterError::InvalidParameter {
                    name: "kernel_size",
                    reason: format!("{} is not odd", s),
                })
            }
            (s, _) => s,
        };
        let sigma = if sigma > 0.0 { sigma } else { sigma_for_size(size) };

        let k1d = gaussian_kernel_1d(size, sigma);
        Self::from_separable(k1d.clone(), k1d)
    }

    /// Horizontal Sobel derivative (responds to changes along x).
    pub fn sobel_x() -> Self {
        Self {
            weights: ndarray::arr2(&[[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]]),
            separable: Some((vec![1.0, 2.0, 1.0], vec![-1.0, 0.0, 1.0])),
        }
    }

    /// Vertical Sobel derivative (responds to changes along y).
    pub fn sobel_y() -> Self {
        Self {
            weights: ndarray::arr2(&[[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]]),
            separable: Some((vec![-1.0, 0.0, 1.0], vec![1.0, 2.0, 1.0])),
        }
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// Column and row factors, if the kernel is separable.
    pub fn separable(&self) -> Option<(&[f32], &[f32])> {
        self.separable
            .as_ref()
            .map(|(column, row)| (column.as_slice(), row.as_slice()))
    }

    /// Anchor offset as (row, column); always the center.
    pub fn anchor(&self) -> (usize, usize) {
        let (rows, cols) = self.weights.dim();
        (rows / 2, cols / 2)
    }

    pub fn sum(&self) -> f32 {
        self.weights.sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_index_inside() {
        assert_eq!(reflect_index(0, 5), 0);
        assert_eq!(reflect_index(4, 5), 4);
    }

    #[test]
    fn test_reflect_index_repeats_edge() {
        // d c b a | a b c d | d c b a
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
    }

    #[test]
    fn test_reflect_index_single_pixel() {
        for i in -3..=3 {
            assert_eq!(reflect_index(i, 1), 0);
        }
    }

    #[test]
    fn test_reflect_index_far_outside_stays_in_range() {
        for i in -20..20 {
            assert!(reflect_index(i, 3) < 3);
        }
    }

    #[test]
    fn test_sigma_for_default_size() {
        assert!((sigma_for_size(5) - 1.1).abs() < 1e-6);
        assert!((sigma_for_size(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_gaussian_kernel_is_normalized_and_symmetric() {
        let k = Kernel::gaussian(5, 0.0).unwrap();

        assert_eq!(k.weights().dim(), (5, 5));
        assert!((k.sum() - 1.0).abs() < 1e-5);
        let w = k.weights();
        assert!((w[[0, 0]] - w[[4, 4]]).abs() < 1e-7);
        assert!((w[[0, 2]] - w[[2, 0]]).abs() < 1e-7);
        assert!(w[[2, 2]] > w[[1, 2]]);
    }

    #[test]
    fn test_gaussian_kernel_is_deterministic() {
        let a = Kernel::gaussian(5, 1.3).unwrap();
        let b = Kernel::gaussian(5, 1.3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gaussian_size_from_sigma() {
        let k = Kernel::gaussian(0, 1.0).unwrap();
        assert_eq!(k.weights().dim(), (7, 7));
    }

    #[test]
    fn test_gaussian_rejects_oversized_kernel() {
        assert!(matches!(
            Kernel::gaussian(usize::MAX, 0.0),
            Err(FilterError::InvalidParameter { name: "kernel_size", .. })
        ));
        assert!(matches!(
            Kernel::gaussian(MAX_KERNEL_SIZE + 2, 0.0),
            Err(FilterError::InvalidParameter { name: "kernel_size", .. })
        ));
        assert!(Kernel::gaussian(MAX_KERNEL_SIZE, 0.0).is_ok());
    }

    #[test]
    fn test_gaussian_rejects_huge_sigma_without_size() {
        assert!(matches!(
            Kernel::gaussian(0, 1e20),
            Err(FilterError::InvalidParameter { name: "sigma", .. })
        ));
        assert_eq!(size_for_sigma(1e20), None);
        assert_eq!(size_for_sigma(1.0), Some(7));
    }

    #[test]
    fn test_gaussian_rejects_underflowing_sigma() {
        assert!(matches!(
            Kernel::gaussian(5, 1e-30),
            Err(FilterError::InvalidParameter { name: "sigma", .. })
        ));
        assert!(Kernel::gaussian(5, 1e-3).is_ok());
    }

    #[test]
    fn test_gaussian_huge_sigma_with_size_is_flat() {
        let k = Kernel::gaussian(3, 1e20).unwrap();

        assert!(k.weights().iter().all(|&w| (w - 1.0 / 9.0).abs() < 1e-6));
    }

    #[test]
    fn test_gaussian_rejects_even_size() {
        assert!(matches!(
            Kernel::gaussian(4, 0.0),
            Err(FilterError::InvalidParameter { name: "kernel_size", .. })
        ));
    }

    #[test]
    fn test_kernel_rejects_even_dimensions() {
        let result = Kernel::new(Array2::zeros((3, 2)));
        assert!(matches!(result, Err(FilterError::InvalidKernel(_))));
    }

    #[test]
    fn test_anchor_is_center() {
        let k = Kernel::new(Array2::zeros((3, 5))).unwrap();
        assert_eq!(k.anchor(), (1, 2));
    }

    #[test]
    fn test_sobel_factors_match_weights() {
        for k in [Kernel::sobel_x(), Kernel::sobel_y()] {
            let (column, row) = k.separable().unwrap();
            for y in 0..3 {
                for x in 0..3 {
                    assert_eq!(k.weights()[[y, x]], column[y] * row[x]);
                }
            }
        }
    }

    #[test]
    fn test_round_clamp_u8() {
        assert_eq!(round_clamp_u8(-3.0), 0);
        assert_eq!(round_clamp_u8(76.245), 76);
        assert_eq!(round_clamp_u8(76.5), 77);
        assert_eq!(round_clamp_u8(300.0), 255);
    }
}
