//! Structure of Arrays (`SoA`) storage for clustered events.
//!
//! This module defines the `CoincidenceTable`, which stores one row per
//! clustered frame in parallel vectors rather than an array of structs.
//! Both detector geometries live in the same table and advance together,
//! so the per-geometry projections can never drift out of alignment.

use crate::geometry::Geometry;
use crate::record::{
    CoincidenceRecord, GeometryRecord, GridChannelFields, GridFields, WireFields,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Columnar wire fields for one geometry.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WireColumns {
    /// Collected charge, first multiplicity.
    pub adc_m1: Vec<u16>,
    /// Collected charge, second multiplicity.
    pub adc_m2: Vec<u16>,
    /// Position ADC, first multiplicity.
    pub raw_channel_m1: Vec<u16>,
    /// Position ADC, second multiplicity.
    pub raw_channel_m2: Vec<u16>,
    /// Mapped wire channel, first multiplicity (-1 if unmapped).
    pub channel_m1: Vec<i16>,
    /// Mapped wire channel, second multiplicity (-1 if unmapped).
    pub channel_m2: Vec<i16>,
}

impl WireColumns {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            adc_m1: Vec::with_capacity(capacity),
            adc_m2: Vec::with_capacity(capacity),
            raw_channel_m1: Vec::with_capacity(capacity),
            raw_channel_m2: Vec::with_capacity(capacity),
            channel_m1: Vec::with_capacity(capacity),
            channel_m2: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, fields: &WireFields) {
        self.adc_m1.push(fields.adc_m1);
        self.adc_m2.push(fields.adc_m2);
        self.raw_channel_m1.push(fields.raw_channel_m1);
        self.raw_channel_m2.push(fields.raw_channel_m2);
        self.channel_m1.push(fields.channel_m1);
        self.channel_m2.push(fields.channel_m2);
    }

    fn append(&mut self, other: &Self) {
        self.adc_m1.extend_from_slice(&other.adc_m1);
        self.adc_m2.extend_from_slice(&other.adc_m2);
        self.raw_channel_m1.extend_from_slice(&other.raw_channel_m1);
        self.raw_channel_m2.extend_from_slice(&other.raw_channel_m2);
        self.channel_m1.extend_from_slice(&other.channel_m1);
        self.channel_m2.extend_from_slice(&other.channel_m2);
    }

    fn clear(&mut self) {
        self.adc_m1.clear();
        self.adc_m2.clear();
        self.raw_channel_m1.clear();
        self.raw_channel_m2.clear();
        self.channel_m1.clear();
        self.channel_m2.clear();
    }

    fn row(&self, index: usize) -> WireFields {
        WireFields {
            adc_m1: self.adc_m1[index],
            adc_m2: self.adc_m2[index],
            raw_channel_m1: self.raw_channel_m1[index],
            raw_channel_m2: self.raw_channel_m2[index],
            channel_m1: self.channel_m1[index],
            channel_m2: self.channel_m2[index],
        }
    }
}

/// Columnar grid ADCs, shared between the geometries.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridColumns {
    /// Collected charge, first multiplicity.
    pub adc_m1: Vec<u16>,
    /// Collected charge, second multiplicity.
    pub adc_m2: Vec<u16>,
    /// Position ADC, first multiplicity.
    pub raw_channel_m1: Vec<u16>,
    /// Position ADC, second multiplicity.
    pub raw_channel_m2: Vec<u16>,
}

impl GridColumns {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            adc_m1: Vec::with_capacity(capacity),
            adc_m2: Vec::with_capacity(capacity),
            raw_channel_m1: Vec::with_capacity(capacity),
            raw_channel_m2: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, fields: &GridFields) {
        self.adc_m1.push(fields.adc_m1);
        self.adc_m2.push(fields.adc_m2);
        self.raw_channel_m1.push(fields.raw_channel_m1);
        self.raw_channel_m2.push(fields.raw_channel_m2);
    }

    fn append(&mut self, other: &Self) {
        self.adc_m1.extend_from_slice(&other.adc_m1);
        self.adc_m2.extend_from_slice(&other.adc_m2);
        self.raw_channel_m1.extend_from_slice(&other.raw_channel_m1);
        self.raw_channel_m2.extend_from_slice(&other.raw_channel_m2);
    }

    fn clear(&mut self) {
        self.adc_m1.clear();
        self.adc_m2.clear();
        self.raw_channel_m1.clear();
        self.raw_channel_m2.clear();
    }

    fn row(&self, index: usize) -> GridFields {
        GridFields {
            adc_m1: self.adc_m1[index],
            adc_m2: self.adc_m2[index],
            raw_channel_m1: self.raw_channel_m1[index],
            raw_channel_m2: self.raw_channel_m2[index],
        }
    }
}

/// Columnar mapped grid channels for one geometry.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridChannelColumns {
    /// Mapped grid channel, first multiplicity (-1 if unmapped).
    pub channel_m1: Vec<i16>,
    /// Mapped grid channel, second multiplicity (-1 if unmapped).
    pub channel_m2: Vec<i16>,
}

impl GridChannelColumns {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            channel_m1: Vec::with_capacity(capacity),
            channel_m2: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, fields: &GridChannelFields) {
        self.channel_m1.push(fields.channel_m1);
        self.channel_m2.push(fields.channel_m2);
    }

    fn append(&mut self, other: &Self) {
        self.channel_m1.extend_from_slice(&other.channel_m1);
        self.channel_m2.extend_from_slice(&other.channel_m2);
    }

    fn clear(&mut self) {
        self.channel_m1.clear();
        self.channel_m2.clear();
    }

    fn row(&self, index: usize) -> GridChannelFields {
        GridChannelFields {
            channel_m1: self.channel_m1[index],
            channel_m2: self.channel_m2[index],
        }
    }
}

/// A batch of clustered coincidence events in `SoA` format.
///
/// One row covers both geometries; use [`CoincidenceTable::view`] to look
/// at the table through a single geometry.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoincidenceTable {
    /// Time of flight per event.
    pub time_of_flight: Vec<u32>,
    /// Module id per event.
    pub module: Vec<u8>,
    /// Wire columns seen by the 16-layer projection.
    pub wires_16: WireColumns,
    /// Wire columns seen by the 20-layer projection.
    pub wires_20: WireColumns,
    /// Shared grid ADC columns.
    pub grids: GridColumns,
    /// Grid channels mapped through the 16-layer calibration.
    pub grid_channels_16: GridChannelColumns,
    /// Grid channels mapped through the 20-layer calibration.
    pub grid_channels_20: GridChannelColumns,
}

impl CoincidenceTable {
    /// Creates an empty table with the given row capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            time_of_flight: Vec::with_capacity(capacity),
            module: Vec::with_capacity(capacity),
            wires_16: WireColumns::with_capacity(capacity),
            wires_20: WireColumns::with_capacity(capacity),
            grids: GridColumns::with_capacity(capacity),
            grid_channels_16: GridChannelColumns::with_capacity(capacity),
            grid_channels_20: GridChannelColumns::with_capacity(capacity),
        }
    }

    /// Returns the number of events in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time_of_flight.len()
    }

    /// Returns true if the table holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time_of_flight.is_empty()
    }

    /// Clears all columns.
    pub fn clear(&mut self) {
        self.time_of_flight.clear();
        self.module.clear();
        self.wires_16.clear();
        self.wires_20.clear();
        self.grids.clear();
        self.grid_channels_16.clear();
        self.grid_channels_20.clear();
    }

    /// Pushes one clustered event onto every column.
    pub fn push(&mut self, record: &CoincidenceRecord) {
        self.time_of_flight.push(record.time_of_flight);
        self.module.push(record.module);
        self.wires_16.push(&record.wires_16);
        self.wires_20.push(&record.wires_20);
        self.grids.push(&record.grids);
        self.grid_channels_16.push(&record.grid_channels_16);
        self.grid_channels_20.push(&record.grid_channels_20);
    }

    /// Appends all events from another table, preserving their order.
    pub fn append(&mut self, other: &CoincidenceTable) {
        self.time_of_flight.extend_from_slice(&other.time_of_flight);
        self.module.extend_from_slice(&other.module);
        self.wires_16.append(&other.wires_16);
        self.wires_20.append(&other.wires_20);
        self.grids.append(&other.grids);
        self.grid_channels_16.append(&other.grid_channels_16);
        self.grid_channels_20.append(&other.grid_channels_20);
    }

    /// Reassembles one row as a record.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn record(&self, index: usize) -> CoincidenceRecord {
        CoincidenceRecord {
            time_of_flight: self.time_of_flight[index],
            module: self.module[index],
            wires_16: self.wires_16.row(index),
            wires_20: self.wires_20.row(index),
            grids: self.grids.row(index),
            grid_channels_16: self.grid_channels_16.row(index),
            grid_channels_20: self.grid_channels_20.row(index),
        }
    }

    /// Borrows the table as a single-geometry projection.
    #[must_use]
    pub fn view(&self, geometry: Geometry) -> GeometryView<'_> {
        let (wires, grid_channels) = match geometry {
            Geometry::SixteenLayer => (&self.wires_16, &self.grid_channels_16),
            Geometry::TwentyLayer => (&self.wires_20, &self.grid_channels_20),
        };
        GeometryView {
            geometry,
            time_of_flight: &self.time_of_flight,
            module: &self.module,
            wires,
            grids: &self.grids,
            grid_channels,
        }
    }
}

/// A borrowed single-geometry projection of a [`CoincidenceTable`].
///
/// Views of the two geometries always have the same length, because they
/// borrow the same rows.
#[derive(Debug, Clone, Copy)]
pub struct GeometryView<'a> {
    /// The projected geometry.
    pub geometry: Geometry,
    /// Time of flight per event.
    pub time_of_flight: &'a [u32],
    /// Module id per event.
    pub module: &'a [u8],
    /// Wire columns for this geometry.
    pub wires: &'a WireColumns,
    /// Shared grid ADC columns.
    pub grids: &'a GridColumns,
    /// Grid channels mapped through this geometry's calibration.
    pub grid_channels: &'a GridChannelColumns,
}

impl GeometryView<'_> {
    /// Returns the number of events in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time_of_flight.len()
    }

    /// Returns true if the view holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time_of_flight.is_empty()
    }

    /// Reassembles one row as seen by this geometry.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn record(&self, index: usize) -> GeometryRecord {
        GeometryRecord {
            time_of_flight: self.time_of_flight[index],
            module: self.module[index],
            wires: self.wires.row(index),
            grids: self.grids.row(index),
            grid_channels: self.grid_channels.row(index),
        }
    }

    /// Iterates over the rows of this view.
    pub fn rows(&self) -> impl Iterator<Item = GeometryRecord> + '_ {
        (0..self.len()).map(|i| self.record(i))
    }
}
