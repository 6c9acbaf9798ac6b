//! Decoder configuration.
//!
//! A [`DecoderConfig`] bundles everything the clusterer needs besides the
//! calibration: the frame layout, the framing discipline, the geometry
//! selection, and the analysis defaults (binning, event filter). Configs
//! can be built in code or loaded from the JSON schema shared with the
//! acquisition tooling; loading validates everything up front.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use multigrid_core::{BinningConfig, ClusterFilter, Geometry, Quantity, RangeFilter};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::{FrameLayout, GeometrySet, Multiplicity, Route, SignalRole};

/// How the clusterer treats words that arrive outside an open frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingMode {
    /// Frames open only on a header word. Data or end-of-event words
    /// outside a frame are counted as framing errors and dropped.
    HeaderDelimited,
    /// A data word outside a frame opens one implicitly, with module id 0.
    /// Matches electronics that suppress headers on a single-bus readout.
    ImplicitOpen,
}

/// Which geometry tables the decoder is expected to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometrySelection {
    /// Both module variants are present on the bus.
    Both,
    /// Only one variant is present; the other table stays unmapped.
    Only(Geometry),
}

impl GeometrySelection {
    /// Whether the selection includes the given geometry.
    #[must_use]
    pub fn contains(self, geometry: Geometry) -> bool {
        match self {
            Self::Both => true,
            Self::Only(selected) => selected == geometry,
        }
    }
}

/// Full decoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Routing table from raw channels to event columns.
    pub layout: FrameLayout,
    /// Framing discipline for out-of-frame words.
    pub framing: FramingMode,
    /// Geometries the calibration must cover.
    pub geometries: GeometrySelection,
    /// Bin counts for the run summary spectra.
    pub binning: BinningConfig,
    /// Event selection applied by the analysis helpers.
    pub filter: ClusterFilter,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::dual_geometry()
    }
}

// Intermediate structs for the acquisition-side JSON schema.
#[derive(Deserialize)]
struct JsonConfig {
    decoder: JsonDecoder,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonDecoder {
    layout: JsonLayout,
    framing: JsonFraming,
    geometries: JsonGeometries,
    routes: Option<Vec<JsonRoute>>,
    binning: JsonBinning,
    filter: JsonFilter,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "snake_case")]
enum JsonLayout {
    #[default]
    DualGeometry,
    SingleBus,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "snake_case")]
enum JsonFraming {
    #[default]
    HeaderDelimited,
    ImplicitOpen,
}

#[derive(Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum JsonGeometries {
    #[default]
    Both,
    SixteenLayer,
    TwentyLayer,
}

#[derive(Deserialize)]
struct JsonRoute {
    channel: u8,
    quantity: JsonQuantity,
    multiplicity: JsonMultiplicity,
    role: JsonRole,
    geometries: JsonGeometries,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum JsonQuantity {
    Wires,
    Grids,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum JsonMultiplicity {
    M1,
    M2,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum JsonRole {
    Amplitude,
    Position,
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonBinning {
    tof_bins: usize,
    pulse_height_bins: usize,
    channel_bins: usize,
}

impl Default for JsonBinning {
    fn default() -> Self {
        let defaults = BinningConfig::default();
        Self {
            tof_bins: defaults.tof_bins,
            pulse_height_bins: defaults.pulse_height_bins,
            channel_bins: defaults.channel_bins,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonFilter {
    wire_adc_m1: Option<[u16; 2]>,
    grid_adc_m1: Option<[u16; 2]>,
    time_of_flight: Option<[u32; 2]>,
    wire_channel_m1: Option<[i16; 2]>,
    grid_channel_m1: Option<[i16; 2]>,
}

fn range<T: Copy + PartialOrd>(bounds: Option<[T; 2]>) -> Option<RangeFilter<T>> {
    bounds.map(|[min, max]| RangeFilter::new(min, max))
}

impl DecoderConfig {
    /// Default configuration for a dual-geometry bus.
    #[must_use]
    pub fn dual_geometry() -> Self {
        Self {
            layout: FrameLayout::dual_geometry(),
            framing: FramingMode::HeaderDelimited,
            geometries: GeometrySelection::Both,
            binning: BinningConfig::default(),
            filter: ClusterFilter::default(),
        }
    }

    /// Default configuration for a single shared bus.
    #[must_use]
    pub fn single_bus() -> Self {
        Self {
            layout: FrameLayout::single_bus(),
            ..Self::dual_geometry()
        }
    }

    /// Replaces the framing discipline.
    #[must_use]
    pub fn with_framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    /// Replaces the geometry selection.
    #[must_use]
    pub fn with_geometries(mut self, geometries: GeometrySelection) -> Self {
        self.geometries = geometries;
        self
    }

    /// Replaces the event filter.
    #[must_use]
    pub fn with_filter(mut self, filter: ClusterFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replaces the binning.
    #[must_use]
    pub fn with_binning(mut self, binning: BinningConfig) -> Self {
        self.binning = binning;
        self
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    /// Fails on unreadable files, schema mismatches, or values that do
    /// not validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let json_config: JsonConfig = serde_json::from_reader(reader)?;
        Self::from_json_config(json_config)
    }

    /// Loads a configuration from a JSON string.
    ///
    /// # Errors
    /// Fails on schema mismatches or values that do not validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let json_config: JsonConfig = serde_json::from_str(json)?;
        Self::from_json_config(json_config)
    }

    fn from_json_config(config: JsonConfig) -> Result<Self> {
        let decoder = config.decoder;

        // Explicit routes override the named layout.
        let layout = match decoder.routes {
            Some(routes) if !routes.is_empty() => {
                let entries: Vec<(u8, Route)> = routes
                    .into_iter()
                    .map(|route| {
                        let geometries = match route.geometries {
                            JsonGeometries::Both => GeometrySet::BOTH,
                            JsonGeometries::SixteenLayer => {
                                GeometrySet::only(Geometry::SixteenLayer)
                            }
                            JsonGeometries::TwentyLayer => {
                                GeometrySet::only(Geometry::TwentyLayer)
                            }
                        };
                        let quantity = match route.quantity {
                            JsonQuantity::Wires => Quantity::Wires,
                            JsonQuantity::Grids => Quantity::Grids,
                        };
                        let multiplicity = match route.multiplicity {
                            JsonMultiplicity::M1 => Multiplicity::M1,
                            JsonMultiplicity::M2 => Multiplicity::M2,
                        };
                        let role = match route.role {
                            JsonRole::Amplitude => SignalRole::Amplitude,
                            JsonRole::Position => SignalRole::Position,
                        };
                        (
                            route.channel,
                            Route::new(quantity, multiplicity, role, geometries),
                        )
                    })
                    .collect();
                FrameLayout::from_routes(&entries)?
            }
            _ => match decoder.layout {
                JsonLayout::DualGeometry => FrameLayout::dual_geometry(),
                JsonLayout::SingleBus => FrameLayout::single_bus(),
            },
        };

        let framing = match decoder.framing {
            JsonFraming::HeaderDelimited => FramingMode::HeaderDelimited,
            JsonFraming::ImplicitOpen => FramingMode::ImplicitOpen,
        };

        let geometries = match decoder.geometries {
            JsonGeometries::Both => GeometrySelection::Both,
            JsonGeometries::SixteenLayer => GeometrySelection::Only(Geometry::SixteenLayer),
            JsonGeometries::TwentyLayer => GeometrySelection::Only(Geometry::TwentyLayer),
        };

        let binning = BinningConfig {
            tof_bins: decoder.binning.tof_bins,
            pulse_height_bins: decoder.binning.pulse_height_bins,
            channel_bins: decoder.binning.channel_bins,
        };

        let filter = ClusterFilter {
            wire_adc_m1: range(decoder.filter.wire_adc_m1),
            grid_adc_m1: range(decoder.filter.grid_adc_m1),
            time_of_flight: range(decoder.filter.time_of_flight),
            wire_channel_m1: range(decoder.filter.wire_channel_m1),
            grid_channel_m1: range(decoder.filter.grid_channel_m1),
        };

        let config = Self {
            layout,
            framing,
            geometries,
            binning,
            filter,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the binning and filter. The layout is validated when it is
    /// built, so loading and hand-construction end up equally checked.
    ///
    /// # Errors
    /// Returns the first failed check.
    pub fn validate(&self) -> Result<()> {
        self.binning.validate()?;
        self.filter.validate()?;
        Ok(())
    }
}
