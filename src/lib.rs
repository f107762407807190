//! dip_filters
//!
//! Native image-filter core for a load / filter / preview / save tool:
//! grayscale conversion, Gaussian blur, Canny-style edge detection and
//! histogram equalization over 8-bit buffers, with Python bindings via PyO3
//! and WASM bindings for JavaScript.
//!
//! ## Image Format
//! A [`PixelBuffer`] holds row-major, channel-interleaved u8 samples:
//! - **Grayscale**: 1 channel
//! - **RGB**: 3 channels, R, G, B order
//!
//! ## Filter Architecture
//! Every filter is a pure function from `&PixelBuffer` to a new buffer.
//! [`pipeline::apply`] selects one by name; the caller keeps the current image
//! and threads it through each call. Decoding, encoding and display scaling
//! belong to the presentation layer.
//!
//! ```
//! use dip_filters::{apply, FilterParams, PixelBuffer};
//!
//! let red = PixelBuffer::filled(4, 4, &[255, 0, 0]).unwrap();
//! let gray = apply(&red, "grayscale", &FilterParams::default()).unwrap();
//! assert!(gray.as_slice().iter().all(|&v| v == 76));
//! ```

pub mod buffer;
pub mod error;
pub mod filters;
pub mod pipeline;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use buffer::PixelBuffer;
pub use error::{FilterError, FilterResult};
pub use filters::blur::BlurParams;
pub use filters::core::Kernel;
pub use filters::edge::EdgeParams;
pub use filters::histogram::Histogram;
pub use pipeline::{apply, apply_kind, FilterKind, FilterParams};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::buffer::PixelBuffer;
    use crate::error::FilterError;
    use crate::filters::blur::BlurParams;
    use crate::filters::edge::EdgeParams;
    use crate::pipeline::{apply, FilterKind, FilterParams};

    impl From<FilterError> for PyErr {
        fn from(err: FilterError) -> Self {
            PyValueError::new_err(err.to_string())
        }
    }

    /// Apply a named filter to a (height, width, channels) uint8 image.
    ///
    /// # Arguments
    /// * `image` - 1 (gray) or 3 (RGB) channel image
    /// * `name` - One of grayscale, blur, edges, histogram_eq
    /// * `kernel_size` - Blur kernel size (odd, default 5)
    /// * `sigma` - Blur sigma (default 0.0: derived from kernel_size)
    /// * `low_threshold` - Edge hysteresis low threshold (default 100)
    /// * `high_threshold` - Edge hysteresis high threshold (default 200)
    /// * `as_rgb` - Replicate single-channel results into 3 channels for display
    #[pyfunction]
    #[pyo3(signature = (image, name, kernel_size=5, sigma=0.0, low_threshold=100.0, high_threshold=200.0, as_rgb=false))]
    #[allow(clippy::too_many_arguments)]
    pub fn apply_filter<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        name: &str,
        kernel_size: usize,
        sigma: f32,
        low_threshold: f32,
        high_threshold: f32,
        as_rgb: bool,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let buffer = PixelBuffer::from_array(image.as_array().to_owned())?;
        let params = FilterParams {
            blur: BlurParams { kernel_size, sigma },
            edges: EdgeParams {
                low_threshold,
                high_threshold,
                ..EdgeParams::default()
            },
        };

        let mut result = py.allow_threads(|| apply(&buffer, name, &params))?;
        if as_rgb {
            result = result.to_rgb()?;
        }
        Ok(result.into_array().into_pyarray(py))
    }

    /// Names accepted by `apply_filter`.
    #[pyfunction]
    pub fn filter_names() -> Vec<&'static str> {
        FilterKind::ALL.iter().map(|kind| kind.name()).collect()
    }

    /// Python module definition
    #[pymodule]
    pub fn dip_filters(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(apply_filter, m)?)?;
        m.add_function(wrap_pyfunction!(filter_names, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::dip_filters;
