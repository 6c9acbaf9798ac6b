//! Dense ADC-to-channel lookup tables.

use crate::interval::CalibrationInterval;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of ADC values covered by a lookup table.
pub const ADC_TABLE_SIZE: usize = 4096;

/// Sentinel for an ADC value outside every calibration interval.
pub const UNCALIBRATED: i16 = -1;

/// A dense ADC-to-physical-channel lookup table.
///
/// Indexed by raw ADC value; every entry is either a physical channel or
/// [`UNCALIBRATED`]. Built once and then only read, so it can be shared
/// freely across decoding threads.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelMap {
    entries: Vec<i16>,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::empty()
    }
}

impl ChannelMap {
    /// Creates a table with every ADC value uncalibrated.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: vec![UNCALIBRATED; ADC_TABLE_SIZE],
        }
    }

    /// Writes one interval's subdivisions into the table.
    ///
    /// The interval is split into `layers` equal parts; each boundary is
    /// rounded to the nearest integer and the half-open span between
    /// consecutive rounded boundaries takes the channel at
    /// `assignments[base + subdivision]`. Later writes overwrite earlier
    /// ones, so rounding collisions resolve in interval order.
    ///
    /// The caller validates bounds and assignment coverage beforehand.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn fill_interval(&mut self, interval: &CalibrationInterval, assignments: &[i16]) {
        let span = interval.stop_adc - interval.start_adc;
        let layers = interval.layers as f64;
        for subdivision in 0..interval.layers {
            let lower = interval.start_adc + span * (subdivision as f64 / layers);
            let upper = interval.start_adc + span * ((subdivision + 1) as f64 / layers);
            let lower = lower.round() as usize;
            let upper = (upper.round() as usize).min(ADC_TABLE_SIZE);
            let channel = assignments[interval.base + subdivision];
            for entry in &mut self.entries[lower..upper] {
                *entry = channel;
            }
        }
    }

    /// Looks up the physical channel for an ADC value.
    ///
    /// ADC values at or beyond the table length (the data words carry a
    /// wider ADC field than the calibrated range) are uncalibrated.
    #[must_use]
    #[inline]
    pub fn lookup(&self, adc: u16) -> i16 {
        self.entries
            .get(usize::from(adc))
            .copied()
            .unwrap_or(UNCALIBRATED)
    }

    /// Number of ADC values with a channel assigned.
    #[must_use]
    pub fn mapped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|&&entry| entry != UNCALIBRATED)
            .count()
    }

    /// The full table, indexed by ADC value.
    #[must_use]
    pub fn entries(&self) -> &[i16] {
        &self.entries
    }
}
