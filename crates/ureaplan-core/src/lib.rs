//! # ureaplan-core: Biomass-to-Urea Network Data Model
//!
//! Provides the validated input data for the plant siting and sizing problem.
//!
//! ## Data Model
//!
//! - [`Location`] - a supply / demand / candidate-site point
//! - [`Source`] - a feedstock or energy commodity ([`SourceKind::Biomass`] or [`SourceKind::Power`])
//! - [`Route`] - a conversion technology from sources to urea
//! - [`ParameterSet`] - the closed universe of the above plus every numeric table keyed by them
//! - [`CapexCurve`] - ordered [`CapacitySegment`]s describing capacity → CAPEX
//!
//! ## ID System
//!
//! Every element is addressed by a newtype wrapper around its declaration index:
//! [`LocationId`], [`SourceId`], [`RouteId`]. IDs are minted by
//! [`ParameterSetBuilder`] and are only meaningful for the set that minted them.
//!
//! ## Quick Start
//!
//! ```rust
//! use ureaplan_core::*;
//!
//! let mut builder = ParameterSet::builder();
//! let farm = builder.location(LocationInfo::new("5001", "Farm"));
//! let city = builder.location(LocationInfo::new("5002", "City"));
//! let husk = builder.source("rice_husk", SourceKind::Biomass);
//! let gasif = builder.route("Pure oxygen gasification");
//!
//! builder
//!     .self_distance(100.0)
//!     .distance(farm, city, 250.0)
//!     .supply(husk, farm, 100.0)
//!     .supply(husk, city, 0.0)
//!     .price(husk, farm, 12.0)
//!     .price(husk, city, 12.0)
//!     .demand(farm, 0.0)
//!     .demand(city, 50.0)
//!     .urea_price(farm, 400.0)
//!     .urea_price(city, 420.0)
//!     .conversion_yield(husk, gasif, 0.81);
//!
//! let params = builder.build()?;
//! assert_eq!(params.distance(city, farm), 250.0);
//! # Ok::<(), ureaplan_core::ValidationError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod capex;
pub mod error;
pub mod filter;
pub mod params;

pub use capex::{CapacityPlan, CapacitySegment, CapexCurve};
pub use error::{ModelConsistencyError, UreaError, UreaResult, ValidationError};
pub use filter::LocationFilter;
pub use params::{ParameterSet, ParameterSetBuilder};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(usize);

impl LocationId {
    #[inline]
    pub fn new(value: usize) -> Self {
        LocationId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl SourceId {
    #[inline]
    pub fn new(value: usize) -> Self {
        SourceId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl RouteId {
    #[inline]
    pub fn new(value: usize) -> Self {
        RouteId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

/// Descriptive attributes of a location, as found in the location table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    /// External identifier, matches the distance table keys
    pub code: String,
    pub name: String,
    /// e.g. "microregion", "state", "municipality"
    pub location_type: String,
    pub region: String,
    pub state: String,
}

impl LocationInfo {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, location_type: impl Into<String>) -> Self {
        self.location_type = location_type.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>, state: impl Into<String>) -> Self {
        self.region = region.into();
        self.state = state.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    #[serde(flatten)]
    pub info: LocationInfo,
}

impl Location {
    pub fn code(&self) -> &str {
        &self.info.code
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.info.name.is_empty() || self.info.name == self.info.code {
            write!(f, "{}", self.info.code)
        } else {
            write!(f, "{} ({})", self.info.name, self.info.code)
        }
    }
}

/// Kind of feedstock commodity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Solid biomass, measured in tonnes and moved by truck
    #[default]
    Biomass,
    /// Grid electricity, measured in MWh and wheeled over the grid
    Power,
}

impl SourceKind {
    /// Whether flows of this commodity pay the per tonne-km trucking rate.
    pub fn is_trucked(&self) -> bool {
        matches!(self, SourceKind::Biomass)
    }

    pub fn unit(&self) -> &'static str {
        match self {
            SourceKind::Biomass => "t",
            SourceKind::Power => "MWh",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub kind: SourceKind,
}

/// A conversion technology pathway from sources to urea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
}
