//! Name-keyed filter dispatch.
//!
//! Presentation layers hold the "current image" themselves and pass it in
//! with a filter name and parameters; each call is independent and returns a
//! fresh buffer.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::error::{FilterError, FilterResult};
use crate::filters::blur::{gaussian_blur, BlurParams};
use crate::filters::edge::{detect_edges, EdgeParams};
use crate::filters::grayscale::to_grayscale;
use crate::filters::histogram::equalize_histogram;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Grayscale,
    Blur,
    Edges,
    HistogramEq,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [
        FilterKind::Grayscale,
        FilterKind::Blur,
        FilterKind::Edges,
        FilterKind::HistogramEq,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Grayscale => "grayscale",
            FilterKind::Blur => "blur",
            FilterKind::Edges => "edges",
            FilterKind::HistogramEq => "histogram_eq",
        }
    }

    /// Channel count of the output for an input with `channels` channels.
    pub fn output_channels(self, channels: usize) -> usize {
        match self {
            FilterKind::Grayscale | FilterKind::Edges => 1,
            FilterKind::Blur | FilterKind::HistogramEq => channels,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FilterError::UnknownFilter(s.to_string()))
    }
}

/// Optional numeric parameters for every filter.
///
/// Defaults reproduce the fixed constants of the desktop tool: a 5x5
/// Gaussian with sigma derived from the size, and edge thresholds 100 / 200.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterParams {
    pub blur: BlurParams,
    pub edges: EdgeParams,
}

impl FilterParams {
    /// Parse parameters from a JSON object; omitted fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Apply the filter called `name` to `buffer`.
///
/// Fails with [`FilterError::UnknownFilter`] for names outside
/// `grayscale`, `blur`, `edges`, `histogram_eq`.
pub fn apply(buffer: &PixelBuffer, name: &str, params: &FilterParams) -> FilterResult {
    let kind = name.parse::<FilterKind>()?;
    apply_kind(buffer, kind, params)
}

/// Apply an already-parsed filter kind.
pub fn apply_kind(buffer: &PixelBuffer, kind: FilterKind, params: &FilterParams) -> FilterResult {
    let start = Instant::now();

    let result = match kind {
        FilterKind::Grayscale => to_grayscale(buffer),
        FilterKind::Blur => gaussian_blur(buffer, &params.blur),
        FilterKind::Edges => detect_edges(buffer, &params.edges),
        FilterKind::HistogramEq => equalize_histogram(buffer),
    };

    match &result {
        Ok(_) => debug!(
            "{} on {}x{}x{} took {:.2} ms",
            kind,
            buffer.width(),
            buffer.height(),
            buffer.channels(),
            start.elapsed().as_secs_f64() * 1000.0
        ),
        Err(err) => debug!("{} failed: {}", kind, err),
    }
    result
}
