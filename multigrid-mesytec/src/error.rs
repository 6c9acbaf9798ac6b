//! Error types for decoding and configuration.

use multigrid_core::{Geometry, Quantity};

use crate::layout::{Multiplicity, SignalRole};

/// Errors from layout validation, configuration loading, or decoder setup.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A route names a raw channel outside the 5-bit field of a data word.
    #[error("route channel {0} is outside the 5-bit raw channel range")]
    ChannelOutOfRange(u8),

    /// Two routes claim the same raw channel.
    #[error("raw channel {0} is routed twice")]
    DuplicateChannel(u8),

    /// Two raw channels feed the same destination column.
    #[error(
        "raw channels {first} and {second} both fill {geometry} {quantity} \
         {role} {multiplicity}"
    )]
    RouteConflict {
        /// Lower of the two conflicting raw channels.
        first: u8,
        /// Higher of the two conflicting raw channels.
        second: u8,
        /// Geometry table the column belongs to.
        geometry: Geometry,
        /// Wire or grid column group.
        quantity: Quantity,
        /// Amplitude or position column.
        role: SignalRole,
        /// Multiplicity rank of the column.
        multiplicity: Multiplicity,
    },

    /// A frame layout with no routes can never produce an event.
    #[error("frame layout has no routes")]
    EmptyLayout,

    /// The decoder was handed a calibration that lacks a selected geometry.
    #[error("no calibration loaded for the {0} geometry")]
    MissingCalibration(Geometry),

    /// A shared type failed validation.
    #[error("invalid configuration: {0}")]
    Core(#[from] multigrid_core::Error),

    /// The configuration file was not valid JSON for the expected schema.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
