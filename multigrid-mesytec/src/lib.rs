//! multigrid-mesytec: Mesytec readout parsing and event clustering.
//!
//! This crate turns buffers of 32-bit Mesytec readout words into the
//! combined coincidence table defined by `multigrid-core`.
//!
//! # Key Components
//!
//! - [`WordKind`] - Readout word classifier with bit field extraction
//! - [`FrameLayout`] - Validated routing table from raw channels to event columns
//! - [`DecoderConfig`] - Layout, framing, and analysis defaults, loadable from JSON
//! - [`EventClusterer`] - Streaming frame state machine
//!
//! # Processing Pipeline
//!
//! 1. Classify each word by its signature bits
//! 2. Cluster header/data/end-of-event runs into frames
//! 3. Route data words through the layout, mapping positions via the calibration
//! 4. Commit one table row per complete frame

pub mod clusterer;
pub mod config;
mod error;
pub mod layout;
pub mod word;

pub use clusterer::{decode_words, DecodeOutput, EventClusterer};
pub use config::{DecoderConfig, FramingMode, GeometrySelection};
pub use error::{Error, Result};
pub use layout::{FrameLayout, GeometrySet, Multiplicity, Route, SignalRole, RAW_CHANNELS};
pub use word::WordKind;

// Re-export the neighbouring crates' core types for convenience.
pub use multigrid_calib::Calibration;
pub use multigrid_core::{CoincidenceTable, DecodeDiagnostics};
