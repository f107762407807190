//! Gaussian blur.
//!
//! Applies the separable Gaussian preset to every channel of a grayscale or
//! RGB buffer.

use serde::{Deserialize, Serialize};

use super::convolve::convolve;
use super::core::Kernel;
use crate::buffer::PixelBuffer;
use crate::error::{FilterError, FilterResult};

pub const DEFAULT_KERNEL_SIZE: usize = 5;

/// Gaussian kernel configuration.
///
/// `sigma <= 0` derives the standard deviation from `kernel_size`;
/// `kernel_size == 0` derives the size from a positive `sigma`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlurParams {
    pub kernel_size: usize,
    pub sigma: f32,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_KERNEL_SIZE,
            sigma: 0.0,
        }
    }
}

impl BlurParams {
    pub fn kernel(&self) -> Result<Kernel, FilterError> {
        Kernel::gaussian(self.kernel_size, self.sigma)
    }
}

/// Apply Gaussian blur to a 1- or 3-channel buffer.
///
/// # Arguments
/// * `buffer` - Grayscale or RGB image
/// * `params` - Kernel size and sigma
///
/// # Returns
/// Blurred buffer with the same dimensions and channel count
pub fn gaussian_blur(buffer: &PixelBuffer, params: &BlurParams) -> FilterResult {
    match buffer.channels() {
        1 | 3 => {}
        other => return Err(FilterError::UnsupportedChannelCount(other)),
    }
    let kernel = params.kernel()?;
    convolve(buffer, &kernel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_spreads_single_bright_pixel() {
        let mut samples = vec![0u8; 7 * 7];
        samples[3 * 7 + 3] = 255;
        let buf = PixelBuffer::new(7, 7, 1, samples).unwrap();

        let result = gaussian_blur(&buf, &BlurParams::default()).unwrap();

        let center = result.get(3, 3, 0).unwrap();
        let near = result.get(4, 3, 0).unwrap();
        let far = result.get(0, 0, 0).unwrap();
        assert!(center < 255);
        assert!(near > 0 && near < center);
        assert_eq!(far, 0);
    }

    #[test]
    fn test_blur_rgb_channels_are_independent() {
        let buf = PixelBuffer::filled(4, 4, &[10, 120, 240]).unwrap();

        let result = gaussian_blur(&buf, &BlurParams::default()).unwrap();

        assert_eq!(result.get(2, 2, 0).unwrap(), 10);
        assert_eq!(result.get(2, 2, 1).unwrap(), 120);
        assert_eq!(result.get(2, 2, 2).unwrap(), 240);
    }

    #[test]
    fn test_blur_is_deterministic() {
        let samples: Vec<u8> = (0..64).map(|i| (i * 29 % 256) as u8).collect();
        let buf = PixelBuffer::new(8, 8, 1, samples).unwrap();
        let params = BlurParams {
            kernel_size: 5,
            sigma: 1.7,
        };

        let a = gaussian_blur(&buf, &params).unwrap();
        let b = gaussian_blur(&buf, &params).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_blur_rejects_even_kernel() {
        let buf = PixelBuffer::filled(2, 2, &[0]).unwrap();
        let params = BlurParams {
            kernel_size: 4,
            sigma: 0.0,
        };

        assert!(matches!(
            gaussian_blur(&buf, &params),
            Err(FilterError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_blur_rejects_rgba() {
        let buf = PixelBuffer::filled(2, 2, &[0, 0, 0, 0]).unwrap();

        assert!(matches!(
            gaussian_blur(&buf, &BlurParams::default()),
            Err(FilterError::UnsupportedChannelCount(4))
        ));
    }
}
