//! Error types for multigrid-core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Multi-Grid event processing.
#[derive(Error, Debug)]
pub enum Error {
    /// A range filter whose lower bound exceeds its upper bound.
    #[error("filter range for {field}: min {min} exceeds max {max}")]
    InvalidFilterRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// A histogram axis configured with zero bins.
    #[error("histogram axis {axis} has zero bins")]
    EmptyBinning { axis: &'static str },
}
