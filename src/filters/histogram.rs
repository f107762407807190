//! Histogram equalization.
//!
//! Grayscale buffers are equalized directly. RGB buffers are split into
//! luminance (BT.601) and two chroma differences; only the luminance is
//! remapped, then R, G, B are recomposed with the original chroma.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::core::round_clamp_u8;
use super::grayscale::{luminance, LUMA_B, LUMA_G, LUMA_R};
use crate::buffer::PixelBuffer;
use crate::error::{FilterError, FilterResult};

pub const BINS: usize = 256;

// Analog YUV chroma scale factors
const U_SCALE: f32 = 0.492;
const V_SCALE: f32 = 0.877;

/// Intensity histogram with one bin per 8-bit level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; BINS],
}

impl Histogram {
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut counts = [0u64; BINS];
        for v in samples {
            counts[v as usize] += 1;
        }
        Self { counts }
    }

    pub fn counts(&self) -> &[u64; BINS] {
        &self.counts
    }

    /// Number of samples counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Cumulative counts; `cdf[v]` is the number of samples <= v.
    pub fn cdf(&self) -> [u64; BINS] {
        let mut cdf = [0u64; BINS];
        let mut running = 0u64;
        for (i, &count) in self.counts.iter().enumerate() {
            running += count;
            cdf[i] = running;
        }
        cdf
    }

    /// Remap table spreading the cumulative distribution over 0-255.
    ///
    /// `lut[v] = round((cdf[v] - cdf_min) / (total - cdf_min) * 255)` where
    /// `cdf_min` is the smallest nonzero cumulative count. When every sample
    /// sits in one bin there is nothing to spread and the table is the
    /// identity.
    pub fn equalization_lut(&self) -> Result<[u8; BINS], FilterError> {
        let cdf = self.cdf();
        let total = cdf[BINS - 1];
        if total == 0 {
            return Err(FilterError::EmptyImage);
        }

        let mut lut = [0u8; BINS];
        let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
        if total == cdf_min {
            for (v, entry) in lut.iter_mut().enumerate() {
                *entry = v as u8;
            }
            return Ok(lut);
        }

        let range = (total - cdf_min) as f64;
        for (v, entry) in lut.iter_mut().enumerate() {
            let scaled = cdf[v].saturating_sub(cdf_min) as f64 / range * 255.0;
            *entry = scaled.round().clamp(0.0, 255.0) as u8;
        }
        Ok(lut)
    }
}

/// One pixel split into luminance and chroma differences.
#[derive(Clone, Copy, Debug)]
struct Yuv {
    y: f32,
    u: f32,
    v: f32,
}

impl Yuv {
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let y = luminance(r, g, b);
        Self {
            y,
            u: U_SCALE * (b as f32 - y),
            v: V_SCALE * (r as f32 - y),
        }
    }

    fn to_rgb(self) -> [u8; 3] {
        let r = self.y + self.v / V_SCALE;
        let b = self.y + self.u / U_SCALE;
        let g = (self.y - LUMA_R * r - LUMA_B * b) / LUMA_G;
        [round_clamp_u8(r), round_clamp_u8(g), round_clamp_u8(b)]
    }
}

fn remap_rgb_pixel(px: &[u8], out: &mut [u8], lut: &[u8; BINS]) {
    let mut yuv = Yuv::from_rgb(px[0], px[1], px[2]);
    // shift by the table delta so the fractional part of y survives
    let level = round_clamp_u8(yuv.y);
    yuv.y += lut[level as usize] as f32 - level as f32;
    out.copy_from_slice(&yuv.to_rgb());
}

/// Equalize the luminance histogram of a grayscale or RGB buffer.
///
/// # Returns
/// New buffer with the same dimensions and channel count
pub fn equalize_histogram(buffer: &PixelBuffer) -> FilterResult {
    let samples = buffer.as_slice();

    let remapped = match buffer.channels() {
        1 => {
            let lut = Histogram::from_samples(samples.iter().copied()).equalization_lut()?;
            samples.iter().map(|&v| lut[v as usize]).collect::<Vec<u8>>()
        }
        3 => {
            let lut = Histogram::from_samples(
                samples
                    .chunks_exact(3)
                    .map(|px| round_clamp_u8(luminance(px[0], px[1], px[2]))),
            )
            .equalization_lut()?;

            let mut out = vec![0u8; samples.len()];

            #[cfg(feature = "parallel")]
            out.par_chunks_exact_mut(3)
                .zip(samples.par_chunks_exact(3))
                .for_each(|(dst, px)| remap_rgb_pixel(px, dst, &lut));

            #[cfg(not(feature = "parallel"))]
            out.chunks_exact_mut(3)
                .zip(samples.chunks_exact(3))
                .for_each(|(dst, px)| remap_rgb_pixel(px, dst, &lut));

            out
        }
        other => return Err(FilterError::UnsupportedChannelCount(other)),
    };

    PixelBuffer::new(buffer.width(), buffer.height(), buffer.channels(), remapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(buf: &PixelBuffer) -> u8 {
        let min = buf.as_slice().iter().copied().min().unwrap();
        let max = buf.as_slice().iter().copied().max().unwrap();
        max - min
    }

    #[test]
    fn test_histogram_counts_sum_to_pixels() {
        let samples: Vec<u8> = (0..48).map(|i| (i * 5 % 256) as u8).collect();
        let hist = Histogram::from_samples(samples.iter().copied());

        assert_eq!(hist.total(), 48);
        assert_eq!(hist.cdf()[255], 48);
    }

    #[test]
    fn test_lut_uses_smallest_nonzero_cdf() {
        // Darkest occupied bin maps to 0, brightest to 255
        let hist = Histogram::from_samples([50u8, 50, 100, 200]);

        let lut = hist.equalization_lut().unwrap();

        assert_eq!(lut[50], 0);
        // (3 - 2) / (4 - 2) * 255 = 127.5
        assert_eq!(lut[100], 128);
        assert_eq!(lut[200], 255);
    }

    #[test]
    fn test_lut_single_bin_is_identity() {
        let hist = Histogram::from_samples([42u8; 9]);

        let lut = hist.equalization_lut().unwrap();

        assert_eq!(lut[42], 42);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
    }

    #[test]
    fn test_empty_histogram_fails() {
        let hist = Histogram::from_samples(std::iter::empty());
        assert!(matches!(hist.equalization_lut(), Err(FilterError::EmptyImage)));
    }

    #[test]
    fn test_equalize_gray_stretches_range() {
        let samples: Vec<u8> = (0..16).map(|i| 100 + i as u8).collect();
        let buf = PixelBuffer::new(4, 4, 1, samples).unwrap();

        let result = equalize_histogram(&buf).unwrap();

        // 16 distinct levels, one pixel each: level k maps to k * 17
        let expected: Vec<u8> = (0..16).map(|k| (k * 17) as u8).collect();
        assert_eq!(result.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_equalize_twice_is_stable() {
        let samples: Vec<u8> = (0..16).map(|i| 10 + i as u8).collect();
        let buf = PixelBuffer::new(4, 4, 1, samples).unwrap();

        let once = equalize_histogram(&buf).unwrap();
        let twice = equalize_histogram(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_equalize_twice_does_not_shrink_spread() {
        let samples: Vec<u8> = (0..64).map(|i| (60 + (i * i) % 70) as u8).collect();
        let buf = PixelBuffer::new(8, 8, 1, samples).unwrap();

        let once = equalize_histogram(&buf).unwrap();
        let twice = equalize_histogram(&once).unwrap();

        assert!(spread(&once) >= spread(&buf));
        assert!(spread(&twice) >= spread(&once));
    }

    #[test]
    fn test_equalize_uniform_image_is_unchanged() {
        let buf = PixelBuffer::filled(3, 3, &[80, 90, 100]).unwrap();

        let result = equalize_histogram(&buf).unwrap();

        assert_eq!(result, buf);
    }

    #[test]
    fn test_equalize_rgb_keeps_gray_pixels_gray() {
        // Gray pixels have zero chroma and must stay neutral
        let samples: Vec<u8> = [60u8, 70, 80, 90].iter().flat_map(|&v| [v, v, v]).collect();
        let buf = PixelBuffer::new(2, 2, 3, samples).unwrap();

        let result = equalize_histogram(&buf).unwrap();

        for px in result.as_slice().chunks_exact(3) {
            assert!((px[0] as i32 - px[1] as i32).abs() <= 1);
            assert!((px[1] as i32 - px[2] as i32).abs() <= 1);
        }
        assert_eq!(result.get(0, 0, 0).unwrap(), 0);
        assert_eq!(result.get(1, 1, 0).unwrap(), 255);
    }

    #[test]
    fn test_yuv_roundtrip() {
        for &(r, g, b) in &[(255u8, 0u8, 0u8), (12, 200, 99), (0, 0, 0), (255, 255, 255)] {
            let rgb = Yuv::from_rgb(r, g, b).to_rgb();
            assert!((rgb[0] as i32 - r as i32).abs() <= 1);
            assert!((rgb[1] as i32 - g as i32).abs() <= 1);
            assert!((rgb[2] as i32 - b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_equalize_rejects_rgba() {
        let buf = PixelBuffer::filled(1, 1, &[1, 2, 3, 4]).unwrap();
        assert!(matches!(
            equalize_histogram(&buf),
            Err(FilterError::UnsupportedChannelCount(4))
        ));
    }
}
