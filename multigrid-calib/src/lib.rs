//! multigrid-calib: ADC-to-channel calibration for Multi-Grid detectors.
//!
//! Position signals arrive as raw ADC values; delimiter tables describe
//! which ADC interval belongs to which physical channel. This crate
//! validates those tables and compiles them into dense lookup maps.
//!
//! # Key Components
//!
//! - [`DelimiterRow`] / [`CalibrationInterval`] - calibration source rows
//! - [`ChannelMap`] - dense ADC lookup with an uncalibrated sentinel
//! - [`Calibration`] - validated, immutable per-geometry tables

pub mod builder;
pub mod error;
pub mod interval;
pub mod map;

pub use builder::{Calibration, CalibrationInput, GeometryCalibration};
pub use error::{Error, Result};
pub use interval::{CalibrationInterval, DelimiterRow};
pub use map::{ChannelMap, ADC_TABLE_SIZE, UNCALIBRATED};
