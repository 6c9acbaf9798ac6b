//! Range filters for clustered events.
//!
//! Mirrors the analysis-side event selection: each parameter gets an
//! optional inclusive range, and a row survives only if every enabled
//! range accepts it.

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::record::GeometryRecord;
use crate::table::CoincidenceTable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeFilter<T> {
    /// Lower bound, inclusive.
    pub min: T,
    /// Upper bound, inclusive.
    pub max: T,
}

impl<T: Copy + PartialOrd> RangeFilter<T> {
    /// Creates a new range.
    #[inline]
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Returns true if `value` lies within the range.
    #[inline]
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

impl<T: Copy + PartialOrd + Into<i64>> RangeFilter<T> {
    fn check(&self, field: &'static str) -> Result<()> {
        if self.min > self.max {
            return Err(Error::InvalidFilterRange {
                field,
                min: self.min.into(),
                max: self.max.into(),
            });
        }
        Ok(())
    }
}

/// Per-parameter event selection, applied through one geometry's view.
///
/// A disabled (`None`) parameter accepts every row. Mapped-channel ranges
/// reject unmapped rows unless the range is widened to include -1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterFilter {
    /// Wire charge, first multiplicity.
    pub wire_adc_m1: Option<RangeFilter<u16>>,
    /// Grid charge, first multiplicity.
    pub grid_adc_m1: Option<RangeFilter<u16>>,
    /// Time of flight.
    pub time_of_flight: Option<RangeFilter<u32>>,
    /// Mapped wire channel, first multiplicity.
    pub wire_channel_m1: Option<RangeFilter<i16>>,
    /// Mapped grid channel, first multiplicity.
    pub grid_channel_m1: Option<RangeFilter<i16>>,
}

impl ClusterFilter {
    /// Checks that every enabled range is well formed.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFilterRange`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if let Some(range) = &self.wire_adc_m1 {
            range.check("wire_adc_m1")?;
        }
        if let Some(range) = &self.grid_adc_m1 {
            range.check("grid_adc_m1")?;
        }
        if let Some(range) = &self.time_of_flight {
            range.check("time_of_flight")?;
        }
        if let Some(range) = &self.wire_channel_m1 {
            range.check("wire_channel_m1")?;
        }
        if let Some(range) = &self.grid_channel_m1 {
            range.check("grid_channel_m1")?;
        }
        Ok(())
    }

    /// Returns true if the row passes every enabled range.
    #[must_use]
    pub fn matches(&self, record: &GeometryRecord) -> bool {
        if let Some(range) = &self.wire_adc_m1 {
            if !range.contains(record.wires.adc_m1) {
                return false;
            }
        }
        if let Some(range) = &self.grid_adc_m1 {
            if !range.contains(record.grids.adc_m1) {
                return false;
            }
        }
        if let Some(range) = &self.time_of_flight {
            if !range.contains(record.time_of_flight) {
                return false;
            }
        }
        if let Some(range) = &self.wire_channel_m1 {
            if !range.contains(record.wires.channel_m1) {
                return false;
            }
        }
        if let Some(range) = &self.grid_channel_m1 {
            if !range.contains(record.grid_channels.channel_m1) {
                return false;
            }
        }
        true
    }

    /// Produces a new table holding the rows whose `geometry` projection
    /// passes the filter. Both geometries of a surviving row are kept, so
    /// the result stays row aligned.
    #[must_use]
    pub fn apply(&self, table: &CoincidenceTable, geometry: Geometry) -> CoincidenceTable {
        let view = table.view(geometry);
        let mut filtered = CoincidenceTable::with_capacity(table.len());
        for index in 0..table.len() {
            if self.matches(&view.record(index)) {
                filtered.push(&table.record(index));
            }
        }
        filtered
    }
}
