//! I/O and aggregation error types.

use thiserror::Error;

/// Result type for run loading and aggregation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from run loading and aggregation.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoder setup or configuration error.
    #[error("decode error: {0}")]
    Decode(#[from] multigrid_mesytec::Error),
}
