//! Immutable 8-bit raster buffer.
//!
//! Samples are stored as an ndarray of shape (height, width, channels) in
//! standard (row-major, channels interleaved) layout. Filters never mutate a
//! buffer; every stage returns a new one.

use ndarray::{Array3, ArrayView3};

use crate::error::FilterError;

/// Highest channel count a buffer may carry (RGBA). Filters accept 1 or 3.
pub const MAX_CHANNELS: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Array3<u8>,
}

impl PixelBuffer {
    /// Build a buffer from row-major interleaved samples.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels (> 0)
    /// * `height` - Image height in pixels (> 0)
    /// * `channels` - Samples per pixel (1..=4)
    /// * `samples` - Exactly `width * height * channels` bytes
    pub fn new(width: usize, height: usize, channels: usize, samples: Vec<u8>) -> Result<Self, FilterError> {
        let invalid = FilterError::InvalidDimensions {
            width,
            height,
            channels,
            len: samples.len(),
        };
        if width == 0 || height == 0 || channels == 0 || channels > MAX_CHANNELS {
            return Err(invalid);
        }
        if width.checked_mul(height).and_then(|n| n.checked_mul(channels)) != Some(samples.len()) {
            return Err(invalid);
        }

        let data = Array3::from_shape_vec((height, width, channels), samples).map_err(|_| invalid)?;
        Ok(Self { data })
    }

    /// Build a buffer filled with a single pixel value.
    pub fn filled(width: usize, height: usize, pixel: &[u8]) -> Result<Self, FilterError> {
        let pixels = width
            .checked_mul(height)
            .filter(|&n| n.checked_mul(pixel.len()).is_some())
            .ok_or(FilterError::InvalidDimensions {
                width,
                height,
                channels: pixel.len(),
                len: 0,
            })?;
        Self::new(width, height, pixel.len(), pixel.repeat(pixels))
    }

    /// Wrap an existing (height, width, channels) array.
    pub fn from_array(array: Array3<u8>) -> Result<Self, FilterError> {
        let (height, width, channels) = array.dim();
        if width == 0 || height == 0 || channels == 0 || channels > MAX_CHANNELS {
            return Err(FilterError::InvalidDimensions {
                width,
                height,
                channels,
                len: array.len(),
            });
        }

        let data = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        Ok(Self { data })
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// Number of pixels (width * height).
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Bounds-checked sample access.
    pub fn get(&self, x: usize, y: usize, channel: usize) -> Result<u8, FilterError> {
        self.data
            .get([y, x, channel])
            .copied()
            .ok_or(FilterError::OutOfBounds { x, y, channel })
    }

    /// Unchecked sample access for filter inner loops.
    #[inline]
    pub(crate) fn sample(&self, x: usize, y: usize, channel: usize) -> u8 {
        self.data[[y, x, channel]]
    }

    /// Row-major interleaved samples.
    pub fn as_slice(&self) -> &[u8] {
        // standard layout is enforced by every constructor
        self.data.as_slice().unwrap_or(&[])
    }

    /// Read-only ndarray view of shape (height, width, channels).
    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    pub fn into_array(self) -> Array3<u8> {
        self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data.into_raw_vec_and_offset().0
    }

    /// Three-channel copy for display.
    ///
    /// Single-channel data is replicated into R, G and B. Filters never call
    /// this; it exists for presentation layers that can only show color images.
    pub fn to_rgb(&self) -> Result<PixelBuffer, FilterError> {
        match self.channels() {
            3 => Ok(self.clone()),
            1 => {
                let (height, width, _) = self.data.dim();
                let data = Array3::from_shape_fn((height, width, 3), |(y, x, _)| self.data[[y, x, 0]]);
                Ok(Self { data })
            }
            other => Err(FilterError::UnsupportedChannelCount(other)),
        }
    }
}
