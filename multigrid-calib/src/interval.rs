//! Delimiter rows and the ADC intervals derived from them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One row of a delimiter table.
///
/// Every row carries a wire interval; the grid interval is optional
/// because the source tables leave grid cells empty (or not-a-number) on
/// rows that contribute wires only.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DelimiterRow {
    /// First ADC value of the wire interval.
    pub wire_start: f64,
    /// One past the last ADC value of the wire interval.
    pub wire_stop: f64,
    /// First ADC value of the grid interval, if the row has one.
    pub grid_start: Option<f64>,
    /// One past the last ADC value of the grid interval, if present.
    pub grid_stop: Option<f64>,
}

impl DelimiterRow {
    /// Creates a wire-only row.
    #[must_use]
    pub fn wires(wire_start: f64, wire_stop: f64) -> Self {
        Self {
            wire_start,
            wire_stop,
            grid_start: None,
            grid_stop: None,
        }
    }

    /// Adds a grid interval to the row.
    #[must_use]
    pub fn with_grids(mut self, grid_start: f64, grid_stop: f64) -> Self {
        self.grid_start = Some(grid_start);
        self.grid_stop = Some(grid_stop);
        self
    }

    /// The grid interval, if the row has a usable one.
    ///
    /// A half-missing pair or a not-a-number boundary counts as absent,
    /// matching the source tables where such cells mean "no entry".
    #[must_use]
    pub fn grid_pair(&self) -> Option<(f64, f64)> {
        match (self.grid_start, self.grid_stop) {
            (Some(start), Some(stop)) if start.is_finite() && stop.is_finite() => {
                Some((start, stop))
            }
            _ => None,
        }
    }
}

/// A contiguous ADC interval subdivided into equally spaced channels.
///
/// `base` is the index of the first channel-assignment entry this
/// interval consumes; an interval with `layers` subdivisions consumes
/// entries `base..base + layers`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationInterval {
    /// First ADC value covered.
    pub start_adc: f64,
    /// One past the last ADC value covered.
    pub stop_adc: f64,
    /// Number of equal subdivisions.
    pub layers: usize,
    /// First channel-assignment index consumed.
    pub base: usize,
}
