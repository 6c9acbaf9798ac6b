//! Error types for multigrid-calib.

use multigrid_core::{Geometry, Quantity};
use thiserror::Error;

/// Result type alias for calibration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Calibration configuration errors.
///
/// All of these are fatal: they surface before any decoding starts.
#[derive(Error, Debug)]
pub enum Error {
    /// Two calibration inputs for the same geometry.
    #[error("duplicate calibration input for {0}")]
    DuplicateGeometry(Geometry),

    /// An input with no delimiter rows at all.
    #[error("calibration input for {0} has no delimiter rows")]
    NoIntervals(Geometry),

    /// An interval whose boundaries are not finite, inverted, or outside
    /// the ADC table.
    #[error("invalid {quantity} interval [{start}, {stop}) for {geometry}")]
    InvalidInterval {
        geometry: Geometry,
        quantity: Quantity,
        start: f64,
        stop: f64,
    },

    /// Channel-assignment list length does not cover the intervals.
    #[error(
        "{geometry} {quantity} channel assignments: expected {expected} entries, found {found}"
    )]
    AssignmentLength {
        geometry: Geometry,
        quantity: Quantity,
        expected: usize,
        found: usize,
    },

    /// A negative channel in an assignment list, which would collide with
    /// the uncalibrated sentinel.
    #[error("negative channel {channel} at {geometry} {quantity} assignment index {index}")]
    NegativeChannel {
        geometry: Geometry,
        quantity: Quantity,
        index: usize,
        channel: i16,
    },

    /// Grid rows present but the grid subdivision count is zero.
    #[error("grid subdivisions is zero for {0}")]
    ZeroGridSubdivisions(Geometry),
}
