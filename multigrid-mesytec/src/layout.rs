//! Frame layout: the routing table from raw channels to event columns.
//!
//! Each data word inside a frame carries a 5-bit raw channel. The layout
//! declares, per raw channel, which column of the coincidence tables the
//! ADC payload lands in. Layouts are validated when they are built, so
//! routing during decoding is a plain array lookup.

use std::fmt;

use multigrid_core::{Geometry, Quantity};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Multiplicity rank of a routed signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    /// Strongest signal of its kind in the frame.
    M1,
    /// Second-strongest signal of its kind in the frame.
    M2,
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::M1 => "m1",
            Self::M2 => "m2",
        })
    }
}

/// What the ADC payload of a routed channel encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRole {
    /// Pulse amplitude, stored as-is.
    Amplitude,
    /// Electrode position, stored raw and also mapped through the
    /// calibration to a physical channel.
    Position,
}

impl fmt::Display for SignalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Amplitude => "amplitude",
            Self::Position => "position",
        })
    }
}

/// The geometry tables a route writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeometrySet {
    /// Route writes the 16-layer table.
    pub sixteen: bool,
    /// Route writes the 20-layer table.
    pub twenty: bool,
}

impl GeometrySet {
    /// Both geometry tables.
    pub const BOTH: Self = Self {
        sixteen: true,
        twenty: true,
    };

    /// The set containing exactly one geometry.
    #[must_use]
    pub fn only(geometry: Geometry) -> Self {
        match geometry {
            Geometry::SixteenLayer => Self {
                sixteen: true,
                twenty: false,
            },
            Geometry::TwentyLayer => Self {
                sixteen: false,
                twenty: true,
            },
        }
    }

    /// Whether the set contains the given geometry.
    #[must_use]
    pub fn contains(self, geometry: Geometry) -> bool {
        match geometry {
            Geometry::SixteenLayer => self.sixteen,
            Geometry::TwentyLayer => self.twenty,
        }
    }

    /// Whether the set contains no geometry at all.
    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.sixteen && !self.twenty
    }
}

/// Destination of one raw channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Wire or grid column group.
    pub quantity: Quantity,
    /// Multiplicity rank of the destination column.
    pub multiplicity: Multiplicity,
    /// Amplitude or position column.
    pub role: SignalRole,
    /// Geometry tables the route writes into.
    pub geometries: GeometrySet,
}

impl Route {
    /// Builds a route from its four coordinates.
    #[must_use]
    pub fn new(
        quantity: Quantity,
        multiplicity: Multiplicity,
        role: SignalRole,
        geometries: GeometrySet,
    ) -> Self {
        Self {
            quantity,
            multiplicity,
            role,
            geometries,
        }
    }
}

/// Number of raw channels addressable by a data word.
pub const RAW_CHANNELS: usize = 32;

/// Validated routing table for one frame layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    routes: [Option<Route>; RAW_CHANNELS],
    data_words: usize,
}

impl FrameLayout {
    /// Builds and validates a layout from explicit `(channel, route)` pairs.
    ///
    /// Rejects channels outside the 5-bit range, channels routed twice,
    /// two channels feeding the same destination column, and empty route
    /// lists.
    pub fn from_routes(entries: &[(u8, Route)]) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::EmptyLayout);
        }

        let mut routes = [None; RAW_CHANNELS];
        let mut claimed: Vec<((Geometry, Quantity, Multiplicity, SignalRole), u8)> = Vec::new();

        for &(channel, route) in entries {
            let slot = usize::from(channel);
            if slot >= RAW_CHANNELS {
                return Err(Error::ChannelOutOfRange(channel));
            }
            if routes[slot].is_some() {
                return Err(Error::DuplicateChannel(channel));
            }

            for geometry in Geometry::ALL {
                if !route.geometries.contains(geometry) {
                    continue;
                }
                let key = (geometry, route.quantity, route.multiplicity, route.role);
                if let Some(&(_, other)) = claimed.iter().find(|(k, _)| *k == key) {
                    return Err(Error::RouteConflict {
                        first: other.min(channel),
                        second: other.max(channel),
                        geometry,
                        quantity: route.quantity,
                        role: route.role,
                        multiplicity: route.multiplicity,
                    });
                }
                claimed.push((key, channel));
            }

            routes[slot] = Some(route);
        }

        let data_words = routes.iter().flatten().count();
        Ok(Self { routes, data_words })
    }

    /// Layout of a bus serving a 16-layer and a 20-layer module side by
    /// side. Wire channels are split per geometry; grid channels are
    /// shared and write both tables.
    #[must_use]
    pub fn dual_geometry() -> Self {
        let sixteen = GeometrySet::only(Geometry::SixteenLayer);
        let twenty = GeometrySet::only(Geometry::TwentyLayer);

        let mut routes = [None; RAW_CHANNELS];
        routes[0] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M1,
            SignalRole::Amplitude,
            sixteen,
        ));
        routes[1] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M2,
            SignalRole::Amplitude,
            sixteen,
        ));
        routes[2] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M1,
            SignalRole::Position,
            sixteen,
        ));
        routes[3] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M2,
            SignalRole::Position,
            sixteen,
        ));
        routes[4] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M1,
            SignalRole::Amplitude,
            twenty,
        ));
        routes[5] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M2,
            SignalRole::Amplitude,
            twenty,
        ));
        routes[6] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M1,
            SignalRole::Position,
            twenty,
        ));
        routes[7] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M2,
            SignalRole::Position,
            twenty,
        ));
        routes[8] = Some(Route::new(
            Quantity::Grids,
            Multiplicity::M1,
            SignalRole::Amplitude,
            GeometrySet::BOTH,
        ));
        routes[9] = Some(Route::new(
            Quantity::Grids,
            Multiplicity::M2,
            SignalRole::Amplitude,
            GeometrySet::BOTH,
        ));
        routes[10] = Some(Route::new(
            Quantity::Grids,
            Multiplicity::M1,
            SignalRole::Position,
            GeometrySet::BOTH,
        ));
        routes[11] = Some(Route::new(
            Quantity::Grids,
            Multiplicity::M2,
            SignalRole::Position,
            GeometrySet::BOTH,
        ));

        Self {
            routes,
            data_words: 12,
        }
    }

    /// Layout of a single shared bus. Every route writes both geometry
    /// tables; which one is physically meaningful is decided downstream.
    #[must_use]
    pub fn single_bus() -> Self {
        let mut routes = [None; RAW_CHANNELS];
        routes[0] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M1,
            SignalRole::Amplitude,
            GeometrySet::BOTH,
        ));
        routes[1] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M2,
            SignalRole::Amplitude,
            GeometrySet::BOTH,
        ));
        routes[2] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M1,
            SignalRole::Position,
            GeometrySet::BOTH,
        ));
        routes[3] = Some(Route::new(
            Quantity::Wires,
            Multiplicity::M2,
            SignalRole::Position,
            GeometrySet::BOTH,
        ));
        routes[4] = Some(Route::new(
            Quantity::Grids,
            Multiplicity::M1,
            SignalRole::Amplitude,
            GeometrySet::BOTH,
        ));
        routes[5] = Some(Route::new(
            Quantity::Grids,
            Multiplicity::M2,
            SignalRole::Amplitude,
            GeometrySet::BOTH,
        ));
        routes[6] = Some(Route::new(
            Quantity::Grids,
            Multiplicity::M1,
            SignalRole::Position,
            GeometrySet::BOTH,
        ));
        routes[7] = Some(Route::new(
            Quantity::Grids,
            Multiplicity::M2,
            SignalRole::Position,
            GeometrySet::BOTH,
        ));

        Self {
            routes,
            data_words: 8,
        }
    }

    /// Route of a raw channel, or `None` for unrouted channels.
    #[must_use]
    #[inline]
    pub fn route(&self, channel: u8) -> Option<&Route> {
        self.routes.get(usize::from(channel))?.as_ref()
    }

    /// Number of routed data words per complete frame.
    #[must_use]
    pub fn data_words(&self) -> usize {
        self.data_words
    }
}
