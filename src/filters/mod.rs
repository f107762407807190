//! Filter modules.
//!
//! ## Supported Formats
//!
//! | Format | Channels | Description |
//! |--------|----------|-------------|
//! | Grayscale8 | 1 | Single luminance channel, 0-255 |
//! | RGB8 | 3 | Red, green, blue, 0-255 |
//!
//! Buffers with any other channel count are rejected with
//! `UnsupportedChannelCount`.
//!
//! ## Architecture
//!
//! - **Pure** - every filter takes `&PixelBuffer` and returns a new buffer
//! - **Float intermediates** - convolution passes run in f32 and round once
//! - **Reflected borders** - output dimensions always equal input dimensions
//! - **Data-parallel** - per-pixel passes use rayon with the `parallel` feature
//!
//! ## Filters
//!
//! - **grayscale**: BT.601 luminance, single channel out
//! - **blur**: separable Gaussian, channel count preserved
//! - **edge**: Canny-style detector, single 0/255 channel out
//! - **histogram**: luminance histogram equalization, channel count preserved

pub mod core;
pub mod convolve;
pub mod grayscale;
pub mod blur;
pub mod edge;
pub mod histogram;
