//! Calibration assembly and validation.
//!
//! Delimiter rows expand into [`CalibrationInterval`]s, intervals fill
//! dense [`ChannelMap`]s, and the result is an immutable [`Calibration`]
//! shared by every decoder. All validation happens here, before any
//! telemetry is touched.

use crate::error::{Error, Result};
use crate::interval::{CalibrationInterval, DelimiterRow};
use crate::map::{ChannelMap, ADC_TABLE_SIZE};
use log::debug;
use multigrid_core::{Geometry, Quantity, GRID_CHANNELS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Calibration source data for one geometry.
///
/// The delimiter rows and channel assignments come from an external table
/// loader; this crate only validates and compiles them. Wire intervals
/// subdivide by the geometry's layer count, grid intervals by
/// `grid_subdivisions`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationInput {
    /// Geometry these tables calibrate.
    pub geometry: Geometry,
    /// Delimiter rows, in table order.
    pub rows: Vec<DelimiterRow>,
    /// Physical wire channels, one per wire subdivision across all rows.
    pub wire_assignments: Vec<i16>,
    /// Physical grid channels, one per grid subdivision across the rows
    /// that carry a grid interval.
    pub grid_assignments: Vec<i16>,
    /// Subdivisions per grid interval.
    pub grid_subdivisions: usize,
}

impl CalibrationInput {
    /// Creates an empty input for a geometry, with the standard grid
    /// subdivision count.
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            rows: Vec::new(),
            wire_assignments: Vec::new(),
            grid_assignments: Vec::new(),
            grid_subdivisions: GRID_CHANNELS,
        }
    }
}

/// The compiled wire and grid lookup tables for one geometry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryCalibration {
    wires: ChannelMap,
    grids: ChannelMap,
}

impl GeometryCalibration {
    fn build(input: &CalibrationInput) -> Result<Self> {
        if input.rows.is_empty() {
            return Err(Error::NoIntervals(input.geometry));
        }

        let wire_intervals = expand_wire_intervals(input)?;
        let grid_intervals = expand_grid_intervals(input)?;

        let wire_expected = wire_intervals.iter().map(|i| i.layers).sum();
        check_assignments(
            input.geometry,
            Quantity::Wires,
            &input.wire_assignments,
            wire_expected,
        )?;
        let grid_expected = grid_intervals.iter().map(|i| i.layers).sum();
        check_assignments(
            input.geometry,
            Quantity::Grids,
            &input.grid_assignments,
            grid_expected,
        )?;

        let mut wires = ChannelMap::empty();
        for interval in &wire_intervals {
            wires.fill_interval(interval, &input.wire_assignments);
        }
        let mut grids = ChannelMap::empty();
        for interval in &grid_intervals {
            grids.fill_interval(interval, &input.grid_assignments);
        }

        debug!(
            "calibrated {}: {} wire and {} grid ADC values mapped",
            input.geometry,
            wires.mapped_count(),
            grids.mapped_count()
        );

        Ok(Self { wires, grids })
    }

    /// The wire lookup table.
    #[must_use]
    pub fn wires(&self) -> &ChannelMap {
        &self.wires
    }

    /// The grid lookup table.
    #[must_use]
    pub fn grids(&self) -> &ChannelMap {
        &self.grids
    }
}

/// Immutable ADC-to-channel calibration for up to both geometries.
///
/// Built once per run; decoding borrows it read-only, so one instance can
/// serve any number of parallel decoders.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    sixteen: Option<GeometryCalibration>,
    twenty: Option<GeometryCalibration>,
}

impl Calibration {
    /// Validates and compiles the given inputs.
    ///
    /// # Errors
    /// Fails fast on the first malformed input; see [`Error`] for the
    /// individual conditions.
    pub fn build(inputs: &[CalibrationInput]) -> Result<Self> {
        let mut sixteen = None;
        let mut twenty = None;
        for input in inputs {
            let built = GeometryCalibration::build(input)?;
            let slot = match input.geometry {
                Geometry::SixteenLayer => &mut sixteen,
                Geometry::TwentyLayer => &mut twenty,
            };
            if slot.is_some() {
                return Err(Error::DuplicateGeometry(input.geometry));
            }
            *slot = Some(built);
        }
        Ok(Self { sixteen, twenty })
    }

    /// The compiled tables for a geometry, if that geometry was supplied.
    #[must_use]
    pub fn geometry(&self, geometry: Geometry) -> Option<&GeometryCalibration> {
        match geometry {
            Geometry::SixteenLayer => self.sixteen.as_ref(),
            Geometry::TwentyLayer => self.twenty.as_ref(),
        }
    }

    /// Returns true if the geometry has compiled tables.
    #[must_use]
    pub fn has(&self, geometry: Geometry) -> bool {
        self.geometry(geometry).is_some()
    }

    /// Maps an ADC value to a physical channel.
    ///
    /// `None` means the geometry was never calibrated; `Some(-1)` means
    /// the geometry is calibrated but the ADC value falls outside every
    /// interval.
    #[must_use]
    #[inline]
    pub fn lookup(&self, geometry: Geometry, quantity: Quantity, adc: u16) -> Option<i16> {
        let tables = self.geometry(geometry)?;
        let map = match quantity {
            Quantity::Wires => &tables.wires,
            Quantity::Grids => &tables.grids,
        };
        Some(map.lookup(adc))
    }
}

#[allow(clippy::cast_precision_loss)]
fn check_interval(
    geometry: Geometry,
    quantity: Quantity,
    start: f64,
    stop: f64,
) -> Result<()> {
    let valid = start.is_finite()
        && stop.is_finite()
        && start >= 0.0
        && stop >= start
        && stop <= ADC_TABLE_SIZE as f64;
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInterval {
            geometry,
            quantity,
            start,
            stop,
        })
    }
}

fn expand_wire_intervals(input: &CalibrationInput) -> Result<Vec<CalibrationInterval>> {
    let layers = input.geometry.layer_count();
    let mut intervals = Vec::with_capacity(input.rows.len());
    let mut base = 0;
    for row in &input.rows {
        check_interval(input.geometry, Quantity::Wires, row.wire_start, row.wire_stop)?;
        intervals.push(CalibrationInterval {
            start_adc: row.wire_start,
            stop_adc: row.wire_stop,
            layers,
            base,
        });
        base += layers;
    }
    Ok(intervals)
}

fn expand_grid_intervals(input: &CalibrationInput) -> Result<Vec<CalibrationInterval>> {
    let mut intervals = Vec::new();
    let mut base = 0;
    for row in &input.rows {
        // Rows without a grid entry contribute wires only.
        let Some((start, stop)) = row.grid_pair() else {
            continue;
        };
        if input.grid_subdivisions == 0 {
            return Err(Error::ZeroGridSubdivisions(input.geometry));
        }
        check_interval(input.geometry, Quantity::Grids, start, stop)?;
        intervals.push(CalibrationInterval {
            start_adc: start,
            stop_adc: stop,
            layers: input.grid_subdivisions,
            base,
        });
        base += input.grid_subdivisions;
    }
    Ok(intervals)
}

fn check_assignments(
    geometry: Geometry,
    quantity: Quantity,
    assignments: &[i16],
    expected: usize,
) -> Result<()> {
    if assignments.len() != expected {
        return Err(Error::AssignmentLength {
            geometry,
            quantity,
            expected,
            found: assignments.len(),
        });
    }
    for (index, &channel) in assignments.iter().enumerate() {
        if channel < 0 {
            return Err(Error::NegativeChannel {
                geometry,
                quantity,
                index,
                channel,
            });
        }
    }
    Ok(())
}
