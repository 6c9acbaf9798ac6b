//! Detector geometry for the Multi-Grid module variants.
//!
//! A Multi-Grid module stacks columns of wire layers behind a shared set of
//! grids. Two mechanical variants exist, with 16 or 20 wire layers per
//! column; both read their grids through the same electronics.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of grid channels per module (shared by both variants).
pub const GRID_CHANNELS: usize = 12;

/// Voxel pitch along a wire column, in millimetres.
const WIRE_PITCH_MM: f64 = 10.0;

/// Pitch between wire layers and between grids, in millimetres.
const LAYER_PITCH_MM: f64 = 23.5;
const GRID_PITCH_MM: f64 = 23.5;

/// Mechanical variant of a Multi-Grid module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Geometry {
    /// 16 wire layers per column, 64 wire channels.
    SixteenLayer,
    /// 20 wire layers per column, 80 wire channels.
    TwentyLayer,
}

impl Geometry {
    /// Both variants, in table order.
    pub const ALL: [Self; 2] = [Self::SixteenLayer, Self::TwentyLayer];

    /// Number of wire layers per column.
    #[must_use]
    #[inline]
    pub fn layer_count(self) -> usize {
        match self {
            Self::SixteenLayer => 16,
            Self::TwentyLayer => 20,
        }
    }

    /// Total number of wire channels (four columns of layers).
    #[must_use]
    #[inline]
    pub fn wire_channels(self) -> usize {
        4 * self.layer_count()
    }

    /// Short label used in diagnostics and calibration tables.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SixteenLayer => "16_layers",
            Self::TwentyLayer => "20_layers",
        }
    }

    /// Physical position of the voxel at (wire channel, grid channel),
    /// as (x, y, z) in millimetres.
    ///
    /// X runs across wire columns, Y along the grids, Z along a column.
    /// Channels outside the variant's range extrapolate on the same pitch.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn voxel_position(self, wire_channel: u16, grid_channel: u16) -> (f64, f64, f64) {
        let layers = self.layer_count();
        let wire = usize::from(wire_channel);
        let x = (wire / layers) as f64 * LAYER_PITCH_MM;
        let y = f64::from(grid_channel) * GRID_PITCH_MM;
        let z = (wire % layers) as f64 * WIRE_PITCH_MM;
        (x, y, z)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which electrode family a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quantity {
    /// Anode wires.
    Wires,
    /// Cathode grids.
    Grids,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wires => "wires",
            Self::Grids => "grids",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_channel_counts() {
        assert_eq!(Geometry::SixteenLayer.layer_count(), 16);
        assert_eq!(Geometry::SixteenLayer.wire_channels(), 64);
        assert_eq!(Geometry::TwentyLayer.layer_count(), 20);
        assert_eq!(Geometry::TwentyLayer.wire_channels(), 80);
    }

    #[test]
    fn test_voxel_position_sixteen() {
        // Wire 0, grid 0 sits at the origin.
        let (x, y, z) = Geometry::SixteenLayer.voxel_position(0, 0);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0);
        assert_relative_eq!(z, 0.0);

        // Wire 17 is layer 1 of column 1.
        let (x, y, z) = Geometry::SixteenLayer.voxel_position(17, 3);
        assert_relative_eq!(x, 23.5);
        assert_relative_eq!(y, 3.0 * 23.5);
        assert_relative_eq!(z, 10.0);
    }

    #[test]
    fn test_voxel_position_twenty() {
        // Wire 20 wraps to the second column in the 20-layer variant.
        let (x, _, z) = Geometry::TwentyLayer.voxel_position(20, 0);
        assert_relative_eq!(x, 23.5);
        assert_relative_eq!(z, 0.0);

        let (x, _, z) = Geometry::TwentyLayer.voxel_position(79, 0);
        assert_relative_eq!(x, 3.0 * 23.5);
        assert_relative_eq!(z, 19.0 * 10.0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Geometry::SixteenLayer.to_string(), "16_layers");
        assert_eq!(Geometry::TwentyLayer.to_string(), "20_layers");
        assert_eq!(Quantity::Wires.to_string(), "wires");
        assert_eq!(Quantity::Grids.to_string(), "grids");
    }
}
