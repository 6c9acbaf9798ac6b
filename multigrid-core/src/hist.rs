//! Histogram accumulators for run summaries.
//!
//! These produce counts only; rendering belongs to the callers. The
//! spectra mirror the standard Multi-Grid run plots: pulse-height spectra
//! over the ADC range, time-of-flight spectra, per-channel occupancy, and
//! the wire/grid coincidence map.

use crate::error::{Error, Result};
use crate::geometry::{Quantity, GRID_CHANNELS};
use crate::table::GeometryView;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One past the largest ADC value shown in pulse-height spectra.
pub const ADC_RANGE: u32 = 4096;

/// Charge-axis bins of the per-channel pulse-height map.
const PULSE_HEIGHT_MAP_CHARGE_BINS: usize = 120;

/// Bin counts for the standard run summary spectra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinningConfig {
    /// Bins of the time-of-flight spectrum.
    pub tof_bins: usize,
    /// Bins of the pulse-height spectra.
    pub pulse_height_bins: usize,
    /// Bins of free-range channel spectra.
    pub channel_bins: usize,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            tof_bins: 100,
            pulse_height_bins: 300,
            channel_bins: 120,
        }
    }
}

impl BinningConfig {
    /// Checks that every axis has at least one bin.
    ///
    /// # Errors
    /// Returns [`Error::EmptyBinning`] naming the offending axis.
    pub fn validate(&self) -> Result<()> {
        if self.tof_bins == 0 {
            return Err(Error::EmptyBinning { axis: "tof" });
        }
        if self.pulse_height_bins == 0 {
            return Err(Error::EmptyBinning {
                axis: "pulse_height",
            });
        }
        if self.channel_bins == 0 {
            return Err(Error::EmptyBinning { axis: "channel" });
        }
        Ok(())
    }
}

/// A fixed-range 1D histogram with `u64` counts.
///
/// Values outside `[low, high)` are dropped, not clamped.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram1D {
    counts: Vec<u64>,
    low: f64,
    high: f64,
    bin_width: f64,
}

impl Histogram1D {
    /// Creates an empty histogram over `[low, high)` with `bins` bins.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(bins: usize, low: f64, high: f64) -> Self {
        let bin_width = if bins > 0 && high > low {
            (high - low) / bins as f64
        } else {
            1.0
        };
        Self {
            counts: vec![0; bins],
            low,
            high,
            bin_width,
        }
    }

    /// Adds one value.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fill(&mut self, value: f64) {
        if value < self.low || value >= self.high {
            return;
        }
        let bin = ((value - self.low) / self.bin_width) as usize;
        // Floating point rounding at the upper edge lands in the last bin.
        let bin = bin.min(self.counts.len().saturating_sub(1));
        if let Some(count) = self.counts.get_mut(bin) {
            *count += 1;
        }
    }

    /// Per-bin counts.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of bins.
    #[must_use]
    #[inline]
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Lower edge of the range.
    #[must_use]
    #[inline]
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper edge of the range.
    #[must_use]
    #[inline]
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Width of one bin.
    #[must_use]
    #[inline]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Sum of all bins.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// A fixed-range 2D histogram with `u64` counts.
///
/// Stored row major as `counts[y_bin * x_bins + x_bin]`. Values outside
/// either range are dropped.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram2D {
    counts: Vec<u64>,
    x_bins: usize,
    y_bins: usize,
    x_low: f64,
    x_width: f64,
    y_low: f64,
    y_width: f64,
    x_high: f64,
    y_high: f64,
}

impl Histogram2D {
    /// Creates an empty histogram over the given axis ranges.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(
        x_bins: usize,
        x_low: f64,
        x_high: f64,
        y_bins: usize,
        y_low: f64,
        y_high: f64,
    ) -> Self {
        let x_width = if x_bins > 0 && x_high > x_low {
            (x_high - x_low) / x_bins as f64
        } else {
            1.0
        };
        let y_width = if y_bins > 0 && y_high > y_low {
            (y_high - y_low) / y_bins as f64
        } else {
            1.0
        };
        Self {
            counts: vec![0; x_bins * y_bins],
            x_bins,
            y_bins,
            x_low,
            x_width,
            y_low,
            y_width,
            x_high,
            y_high,
        }
    }

    /// Adds one (x, y) pair.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fill(&mut self, x: f64, y: f64) {
        if x < self.x_low || x >= self.x_high || y < self.y_low || y >= self.y_high {
            return;
        }
        let x_bin = (((x - self.x_low) / self.x_width) as usize).min(self.x_bins.saturating_sub(1));
        let y_bin = (((y - self.y_low) / self.y_width) as usize).min(self.y_bins.saturating_sub(1));
        let index = y_bin * self.x_bins + x_bin;
        if let Some(count) = self.counts.get_mut(index) {
            *count += 1;
        }
    }

    /// Count in the given bin, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, x_bin: usize, y_bin: usize) -> Option<u64> {
        if x_bin < self.x_bins && y_bin < self.y_bins {
            Some(self.counts[y_bin * self.x_bins + x_bin])
        } else {
            None
        }
    }

    /// Flattened row-major counts.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of bins on the x axis.
    #[must_use]
    #[inline]
    pub fn x_bins(&self) -> usize {
        self.x_bins
    }

    /// Number of bins on the y axis.
    #[must_use]
    #[inline]
    pub fn y_bins(&self) -> usize {
        self.y_bins
    }

    /// Sum of all bins.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Time-of-flight spectrum of a view, auto ranged from the data.
#[must_use]
pub fn tof_spectrum(view: &GeometryView<'_>, bins: usize) -> Histogram1D {
    let high = view
        .time_of_flight
        .iter()
        .max()
        .map_or(1.0, |max| f64::from(*max) + 1.0);
    let mut hist = Histogram1D::new(bins, 0.0, high);
    for &tof in view.time_of_flight {
        hist.fill(f64::from(tof));
    }
    hist
}

/// Pulse-height spectrum of the first-multiplicity charge, over the full
/// ADC range.
#[must_use]
pub fn pulse_height_spectrum(
    view: &GeometryView<'_>,
    quantity: Quantity,
    bins: usize,
) -> Histogram1D {
    let values = match quantity {
        Quantity::Wires => &view.wires.adc_m1,
        Quantity::Grids => &view.grids.adc_m1,
    };
    let mut hist = Histogram1D::new(bins, 0.0, f64::from(ADC_RANGE));
    for &adc in values {
        hist.fill(f64::from(adc));
    }
    hist
}

/// Occupancy of mapped first-multiplicity channels, one bin per channel.
///
/// Unmapped rows (-1) fall outside the range and are not counted.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn channel_spectrum(view: &GeometryView<'_>, quantity: Quantity) -> Histogram1D {
    let (values, channels) = match quantity {
        Quantity::Wires => (&view.wires.channel_m1, view.geometry.wire_channels()),
        Quantity::Grids => (&view.grid_channels.channel_m1, GRID_CHANNELS),
    };
    let mut hist = Histogram1D::new(channels, -0.5, channels as f64 - 0.5);
    for &channel in values {
        hist.fill(f64::from(channel));
    }
    hist
}

/// Per-channel pulse-height map: mapped channel on x, charge on y.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pulse_height_map(view: &GeometryView<'_>, quantity: Quantity) -> Histogram2D {
    let (channels, adcs, channel_count) = match quantity {
        Quantity::Wires => (
            &view.wires.channel_m1,
            &view.wires.adc_m1,
            view.geometry.wire_channels(),
        ),
        Quantity::Grids => (
            &view.grid_channels.channel_m1,
            &view.grids.adc_m1,
            GRID_CHANNELS,
        ),
    };
    let mut hist = Histogram2D::new(
        channel_count,
        -0.5,
        channel_count as f64 - 0.5,
        PULSE_HEIGHT_MAP_CHARGE_BINS,
        0.0,
        f64::from(ADC_RANGE),
    );
    for (&channel, &adc) in channels.iter().zip(adcs.iter()) {
        hist.fill(f64::from(channel), f64::from(adc));
    }
    hist
}

/// (wire channel, grid channel) pairs with the brighter grid multiplicity.
///
/// Per row, the grid multiplicity with the larger charge wins; ties go to
/// the second multiplicity. The wire channel is always the first
/// multiplicity's. Unmapped channels come through as -1.
#[must_use]
pub fn brightest_grid_pairs(view: &GeometryView<'_>) -> Vec<(i16, i16)> {
    let mut pairs = Vec::with_capacity(view.len());
    for i in 0..view.len() {
        let grid_channel = if view.grids.adc_m1[i] > view.grids.adc_m2[i] {
            view.grid_channels.channel_m1[i]
        } else {
            view.grid_channels.channel_m2[i]
        };
        pairs.push((view.wires.channel_m1[i], grid_channel));
    }
    pairs
}

/// Coincidence map of mapped wire channel against the brightest grid
/// channel, one bin per channel on both axes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn coincidence_map(view: &GeometryView<'_>) -> Histogram2D {
    let wires = view.geometry.wire_channels();
    let mut hist = Histogram2D::new(
        wires,
        -0.5,
        wires as f64 - 0.5,
        GRID_CHANNELS,
        -0.5,
        GRID_CHANNELS as f64 - 0.5,
    );
    for (wire, grid) in brightest_grid_pairs(view) {
        hist.fill(f64::from(wire), f64::from(grid));
    }
    hist
}
