//! multigrid-core: Core types for Multi-Grid detector event processing.
//!
//! This crate provides the shared data model for clustered coincidence
//! events: detector geometry, the combined event table with per-geometry
//! projections, decode diagnostics, event filters, and histogram
//! accumulators.
//!

pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod hist;
pub mod record;
pub mod table;

pub use diagnostics::DecodeDiagnostics;
pub use error::{Error, Result};
pub use filter::{ClusterFilter, RangeFilter};
pub use geometry::{Geometry, Quantity, GRID_CHANNELS};
pub use hist::{BinningConfig, Histogram1D, Histogram2D};
pub use record::{CoincidenceRecord, GeometryRecord, GridChannelFields, GridFields, WireFields};
pub use table::{CoincidenceTable, GeometryView, GridChannelColumns, GridColumns, WireColumns};
