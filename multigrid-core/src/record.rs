//! Row types for clustered coincidence events.

use crate::geometry::Geometry;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wire-side fields of one event, for one geometry.
///
/// `m1` and `m2` are the two recorded multiplicities of the same frame.
/// Raw channels carry the position ADC as read out; mapped channels come
/// from the calibration lookup, with -1 marking an unmapped value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WireFields {
    /// Collected charge, first multiplicity.
    pub adc_m1: u16,
    /// Collected charge, second multiplicity.
    pub adc_m2: u16,
    /// Position ADC, first multiplicity.
    pub raw_channel_m1: u16,
    /// Position ADC, second multiplicity.
    pub raw_channel_m2: u16,
    /// Mapped physical wire channel, first multiplicity (-1 if unmapped).
    pub channel_m1: i16,
    /// Mapped physical wire channel, second multiplicity (-1 if unmapped).
    pub channel_m2: i16,
}

/// Grid-side charge and position ADCs of one event.
///
/// The grid electronics are shared between the geometry variants, so these
/// fields appear once per event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridFields {
    /// Collected charge, first multiplicity.
    pub adc_m1: u16,
    /// Collected charge, second multiplicity.
    pub adc_m2: u16,
    /// Position ADC, first multiplicity.
    pub raw_channel_m1: u16,
    /// Position ADC, second multiplicity.
    pub raw_channel_m2: u16,
}

/// Mapped grid channels of one event, for one geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridChannelFields {
    /// Mapped physical grid channel, first multiplicity (-1 if unmapped).
    pub channel_m1: i16,
    /// Mapped physical grid channel, second multiplicity (-1 if unmapped).
    pub channel_m2: i16,
}

/// One fully clustered coincidence event, carrying both geometries.
///
/// Fields untouched by the frame keep their zero defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoincidenceRecord {
    /// Time of flight from the end-of-event word.
    pub time_of_flight: u32,
    /// Module id from the frame header (0 under implicit framing).
    pub module: u8,
    /// Wire fields seen by the 16-layer tables.
    pub wires_16: WireFields,
    /// Wire fields seen by the 20-layer tables.
    pub wires_20: WireFields,
    /// Shared grid ADCs.
    pub grids: GridFields,
    /// Grid channels mapped through the 16-layer calibration.
    pub grid_channels_16: GridChannelFields,
    /// Grid channels mapped through the 20-layer calibration.
    pub grid_channels_20: GridChannelFields,
}

impl CoincidenceRecord {
    /// Wire fields for the given geometry.
    #[must_use]
    #[inline]
    pub fn wires(&self, geometry: Geometry) -> &WireFields {
        match geometry {
            Geometry::SixteenLayer => &self.wires_16,
            Geometry::TwentyLayer => &self.wires_20,
        }
    }

    /// Mutable wire fields for the given geometry.
    #[inline]
    pub fn wires_mut(&mut self, geometry: Geometry) -> &mut WireFields {
        match geometry {
            Geometry::SixteenLayer => &mut self.wires_16,
            Geometry::TwentyLayer => &mut self.wires_20,
        }
    }

    /// Mapped grid channels for the given geometry.
    #[must_use]
    #[inline]
    pub fn grid_channels(&self, geometry: Geometry) -> &GridChannelFields {
        match geometry {
            Geometry::SixteenLayer => &self.grid_channels_16,
            Geometry::TwentyLayer => &self.grid_channels_20,
        }
    }

    /// Mutable mapped grid channels for the given geometry.
    #[inline]
    pub fn grid_channels_mut(&mut self, geometry: Geometry) -> &mut GridChannelFields {
        match geometry {
            Geometry::SixteenLayer => &mut self.grid_channels_16,
            Geometry::TwentyLayer => &mut self.grid_channels_20,
        }
    }
}

/// One event as seen through a single geometry's projection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryRecord {
    /// Time of flight from the end-of-event word.
    pub time_of_flight: u32,
    /// Module id from the frame header.
    pub module: u8,
    /// Wire fields for this geometry.
    pub wires: WireFields,
    /// Shared grid ADCs.
    pub grids: GridFields,
    /// Grid channels mapped through this geometry's calibration.
    pub grid_channels: GridChannelFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults_are_zero() {
        let record = CoincidenceRecord::default();
        assert_eq!(record.time_of_flight, 0);
        assert_eq!(record.module, 0);
        assert_eq!(record.wires_16.adc_m1, 0);
        assert_eq!(record.wires_20.channel_m2, 0);
        assert_eq!(record.grids.raw_channel_m1, 0);
        assert_eq!(record.grid_channels_16.channel_m1, 0);
    }

    #[test]
    fn test_geometry_accessors() {
        let mut record = CoincidenceRecord::default();
        record.wires_mut(Geometry::TwentyLayer).adc_m1 = 700;
        record.grid_channels_mut(Geometry::SixteenLayer).channel_m1 = 4;

        assert_eq!(record.wires(Geometry::TwentyLayer).adc_m1, 700);
        assert_eq!(record.wires(Geometry::SixteenLayer).adc_m1, 0);
        assert_eq!(record.grid_channels(Geometry::SixteenLayer).channel_m1, 4);
        assert_eq!(record.grid_channels(Geometry::TwentyLayer).channel_m1, 0);
    }
}
