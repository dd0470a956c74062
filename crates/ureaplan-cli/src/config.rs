//! Scenario file
//!
//! A scenario names the input tables and every modelling choice of one run.
//! Relative table paths resolve against the scenario file's directory.
//!
//! ```toml
//! big_m = 1e7                      # optional, derived when absent
//!
//! [data]
//! locations = "locations.csv"
//! distances = "distances.csv"
//! distance_offset = 100.0
//!
//! [filter]
//! location_types = ["microregion"]
//!
//! [[sources]]
//! name = "rice_husk"
//! kind = "biomass"
//!
//! [[routes]]
//! name = "Pure oxygen gasification"
//! conversion = { rice_husk = 0.81 }
//!
//! [economics]
//! discount_rate = 0.10
//!
//! [capacity]
//! capex_scale = 1e6
//!
//! [solver]
//! backend = "microlp"
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use ureaplan_algo::{Economics, SitingProblem, SitingProblemBuilder, SolverConfig};
use ureaplan_core::{
    CapacityPlan, CapacitySegment, CapexCurve, LocationFilter, ParameterSet, SourceKind,
};
use ureaplan_io::{DistanceTable, LocationTable};

/// One siting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub data: DataConfig,
    #[serde(default)]
    pub filter: LocationFilter,
    pub sources: Vec<SourceConfig>,
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub economics: Economics,
    #[serde(default)]
    pub capacity: CapacityConfig,
    /// Production big-M override
    #[serde(default)]
    pub big_m: Option<f64>,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Input tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub locations: PathBuf,
    pub distances: PathBuf,
    /// Added to every distance entry, diagonal included
    #[serde(default = "default_distance_offset")]
    pub distance_offset: f64,
    /// Overrides every diagonal entry after the offset
    #[serde(default)]
    pub self_distance: Option<f64>,
    /// Average each pair given in both directions
    #[serde(default)]
    pub symmetrize: bool,
}

fn default_distance_offset() -> f64 {
    100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default)]
    pub kind: SourceKind,
}

/// A conversion route. Sources missing from a yield table yield nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    #[serde(default)]
    pub conversion: BTreeMap<String, f64>,
    #[serde(default)]
    pub utility: BTreeMap<String, f64>,
}

/// Plant sizing: a CAPEX curve (the reference table unless segments are
/// given) or a fixed capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    pub segments: Option<Vec<CapacitySegment>>,
    pub fixed: Option<FixedCapacity>,
    /// Multiplier on every CAPEX coefficient (curve units → currency)
    pub capex_scale: f64,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            segments: None,
            fixed: None,
            capex_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FixedCapacity {
    pub capacity: f64,
    pub capex: f64,
}

impl CapacityConfig {
    pub fn plan(&self) -> Result<CapacityPlan> {
        if !self.capex_scale.is_finite() || self.capex_scale < 0.0 {
            bail!("capex_scale must be finite and non-negative, got {}", self.capex_scale);
        }
        match (&self.fixed, &self.segments) {
            (Some(_), Some(_)) => bail!("[capacity] sets both `fixed` and `segments`"),
            (Some(fixed), None) => Ok(CapacityPlan::Fixed {
                capacity: fixed.capacity,
                capex: fixed.capex * self.capex_scale,
            }),
            (None, segments) => {
                let curve = match segments {
                    Some(segments) => CapexCurve::new(segments.clone())?,
                    None => CapexCurve::reference(),
                };
                Ok(CapacityPlan::Sized(curve.scaled(self.capex_scale)?))
            }
        }
    }
}

impl Scenario {
    /// Read a scenario and resolve its table paths.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let mut scenario: Scenario = toml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        scenario.data.locations = base.join(&scenario.data.locations);
        scenario.data.distances = base.join(&scenario.data.distances);
        Ok(scenario)
    }

    /// Load the tables and build the validated parameter set.
    pub fn parameter_set(&self) -> Result<ParameterSet> {
        if self.sources.is_empty() {
            bail!("scenario declares no [[sources]]");
        }
        let names: Vec<String> = self.sources.iter().map(|s| s.name.clone()).collect();

        let table = LocationTable::from_path(&self.data.locations, &names)
            .with_context(|| format!("loading locations from {}", self.data.locations.display()))?;
        let table = if self.filter.is_unrestricted() {
            table
        } else {
            table.filtered(&self.filter)?
        };

        let mut builder = ParameterSet::builder();
        let source_ids: Vec<_> = self
            .sources
            .iter()
            .map(|s| builder.source(s.name.clone(), s.kind))
            .collect();

        let has_utility = self.routes.iter().any(|r| !r.utility.is_empty());
        for route in &self.routes {
            for name in route.conversion.keys().chain(route.utility.keys()) {
                if !names.contains(name) {
                    bail!("route '{}' names unknown source '{}'", route.name, name);
                }
            }
            let id = builder.route(route.name.clone());
            for (source, &sid) in self.sources.iter().zip(&source_ids) {
                let conversion = route.conversion.get(&source.name).copied().unwrap_or(0.0);
                builder.conversion_yield(sid, id, conversion);
                if has_utility {
                    let utility = route.utility.get(&source.name).copied().unwrap_or(0.0);
                    builder.utility_yield(sid, id, utility);
                }
            }
        }

        table.apply(&mut builder, &source_ids)?;

        let distances = DistanceTable::from_path(&self.data.distances)
            .with_context(|| format!("loading distances from {}", self.data.distances.display()))?;
        let distances = if self.data.symmetrize {
            distances.symmetrized()
        } else {
            distances
        };
        distances.apply(&mut builder, self.data.distance_offset)?;
        if let Some(d) = self.data.self_distance {
            builder.self_distance(d);
        }

        Ok(builder.build()?)
    }

    pub fn problem(&self, params: ParameterSet) -> Result<SitingProblem> {
        let mut builder = SitingProblemBuilder::new(params).economics(self.economics.clone());
        builder = match self.capacity.plan()? {
            CapacityPlan::Sized(curve) => builder.capex_curve(curve),
            CapacityPlan::Fixed { capacity, capex } => builder.fixed_capacity(capacity, capex),
        };
        if let Some(m) = self.big_m {
            builder = builder.big_m(m);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[data]
locations = "locations.csv"
distances = "distances.csv"

[[sources]]
name = "rice_husk"

[[routes]]
name = "Pure oxygen gasification"
conversion = { rice_husk = 0.81 }
"#;

    #[test]
    fn test_defaults() {
        let scenario: Scenario = toml::from_str(MINIMAL).unwrap();
        assert_eq!(scenario.data.distance_offset, 100.0);
        assert_eq!(scenario.economics, Economics::default());
        assert_eq!(scenario.sources[0].kind, SourceKind::Biomass);
        assert!(scenario.filter.is_unrestricted());
        assert!(scenario.big_m.is_none());

        match scenario.capacity.plan().unwrap() {
            CapacityPlan::Sized(curve) => assert_eq!(curve, CapexCurve::reference()),
            other => panic!("expected a sized plan, got {other:?}"),
        }
    }

    #[test]
    fn test_capex_scale_and_fixed_plan() {
        let toml = format!("{MINIMAL}\n[capacity]\ncapex_scale = 1e6\nfixed = {{ capacity = 20.0, capex = 2.5 }}\n");
        let scenario: Scenario = toml::from_str(&toml).unwrap();
        match scenario.capacity.plan().unwrap() {
            CapacityPlan::Fixed { capacity, capex } => {
                assert_eq!(capacity, 20.0);
                assert_eq!(capex, 2.5e6);
            }
            other => panic!("expected a fixed plan, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_and_segments_conflict() {
        let config = CapacityConfig {
            segments: Some(vec![CapacitySegment::new(0.0, 10.0, 0.0, 1.0)]),
            fixed: Some(FixedCapacity {
                capacity: 5.0,
                capex: 1.0,
            }),
            capex_scale: 1.0,
        };
        assert!(config.plan().is_err());
    }
}
