//! WebAssembly exports.
//!
//! Buffers cross the boundary as flat row-major byte arrays plus their
//! dimensions. Parameters travel as a JSON object (see `FilterParams`); an
//! empty string selects the defaults.

use wasm_bindgen::prelude::*;

use crate::buffer::PixelBuffer;
use crate::error::FilterError;
use crate::pipeline::{apply, FilterKind, FilterParams};

impl From<FilterError> for JsValue {
    fn from(err: FilterError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Apply a named filter to a flat image.
///
/// # Arguments
/// * `data` - Interleaved samples (length = width * height * channels)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - 1 (gray) or 3 (RGB)
/// * `name` - One of `grayscale`, `blur`, `edges`, `histogram_eq`
/// * `params_json` - JSON parameters, or "" for defaults
///
/// # Returns
/// Flat output samples; the channel count is given by `output_channels_wasm`
#[wasm_bindgen]
pub fn apply_filter_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    name: &str,
    params_json: &str,
) -> Result<Vec<u8>, JsValue> {
    let params = if params_json.trim().is_empty() {
        FilterParams::default()
    } else {
        FilterParams::from_json(params_json)?
    };

    let buffer = PixelBuffer::new(width, height, channels, data.to_vec())?;
    let result = apply(&buffer, name, &params)?;
    Ok(result.into_raw())
}

/// Channel count `apply_filter_wasm` returns for the given filter and input.
#[wasm_bindgen]
pub fn output_channels_wasm(name: &str, channels: usize) -> Result<usize, JsValue> {
    let kind: FilterKind = name.parse()?;
    Ok(kind.output_channels(channels))
}
