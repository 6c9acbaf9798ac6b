//! multigrid-batch: run loading and multi-file aggregation.
//!
//! This crate memory-maps Multi-Grid telemetry files and decodes them
//! with `multigrid-mesytec`, sequentially or on the rayon pool. A run's
//! files are always aggregated in the order they were given, so parallel
//! and sequential decoding produce identical output.

mod aggregate;
mod error;
mod source;

pub use aggregate::{DecodedFile, FileAggregator, FileReport, RunOutput};
pub use error::{Error, Result};
pub use source::RunFile;
