//! Validated parameter tables for one optimization run.
//!
//! A [`ParameterSet`] is assembled once through [`ParameterSetBuilder`] and is
//! immutable afterwards. Construction checks that every table is complete for
//! the declared locations, sources and routes, that no magnitude is negative or
//! non-finite, and that distances are symmetric. Once built, every lookup is a
//! total function over the declared sets.
//!
//! Tables are stored densely, row-major:
//!
//! ```text
//! supply, price        [source][location]
//! demand, urea_price   [location]
//! distance             [location][location]   (symmetric)
//! conversion, utility  [source][route]
//! ```

use crate::error::ValidationError;
use crate::filter::LocationFilter;
use crate::{Location, LocationId, LocationInfo, Route, RouteId, Source, SourceId, SourceKind};
use std::collections::{HashMap, HashSet};

const SYMMETRY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    locations: Vec<Location>,
    sources: Vec<Source>,
    routes: Vec<Route>,
    supply: Vec<f64>,
    price: Vec<f64>,
    demand: Vec<f64>,
    urea_price: Vec<f64>,
    distance: Vec<f64>,
    conversion: Vec<f64>,
    utility: Option<Vec<f64>>,
}

impl ParameterSet {
    pub fn builder() -> ParameterSetBuilder {
        ParameterSetBuilder::default()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn location_ids(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.locations.iter().map(|l| l.id)
    }

    pub fn source_ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.iter().map(|s| s.id)
    }

    pub fn route_ids(&self) -> impl Iterator<Item = RouteId> + '_ {
        self.routes.iter().map(|r| r.id)
    }

    pub fn num_locations(&self) -> usize {
        self.locations.len()
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.value()]
    }

    pub fn source(&self, id: SourceId) -> &Source {
        &self.sources[id.value()]
    }

    pub fn route(&self, id: RouteId) -> &Route {
        &self.routes[id.value()]
    }

    pub fn location_by_code(&self, code: &str) -> Option<LocationId> {
        self.locations.iter().find(|l| l.code() == code).map(|l| l.id)
    }

    /// Available supply of `source` at `location` (t or MWh per year).
    pub fn supply(&self, source: SourceId, location: LocationId) -> f64 {
        self.supply[source.value() * self.locations.len() + location.value()]
    }

    /// Unit price of `source` at `location`.
    pub fn price(&self, source: SourceId, location: LocationId) -> f64 {
        self.price[source.value() * self.locations.len() + location.value()]
    }

    /// Yearly urea demand at `location` (t).
    pub fn demand(&self, location: LocationId) -> f64 {
        self.demand[location.value()]
    }

    pub fn urea_price(&self, location: LocationId) -> f64 {
        self.urea_price[location.value()]
    }

    /// Symmetric transport distance; the diagonal holds the intra-location distance.
    pub fn distance(&self, a: LocationId, b: LocationId) -> f64 {
        self.distance[a.value() * self.locations.len() + b.value()]
    }

    /// Urea output per unit of `source` fed to `route`.
    pub fn conversion_yield(&self, source: SourceId, route: RouteId) -> f64 {
        self.conversion[source.value() * self.routes.len() + route.value()]
    }

    /// Auxiliary utility per unit of `source` fed to `route`; zero when no
    /// utility table was declared.
    pub fn utility_yield(&self, source: SourceId, route: RouteId) -> f64 {
        match &self.utility {
            Some(table) => table[source.value() * self.routes.len() + route.value()],
            None => 0.0,
        }
    }

    pub fn has_utility_yields(&self) -> bool {
        self.utility.is_some()
    }

    pub fn total_demand(&self) -> f64 {
        self.demand.iter().sum()
    }

    pub fn total_supply(&self, source: SourceId) -> f64 {
        self.location_ids().map(|l| self.supply(source, l)).sum()
    }

    pub fn max_distance(&self) -> f64 {
        self.distance.iter().copied().fold(0.0, f64::max)
    }

    /// Copy of this set with one location's urea price replaced.
    pub fn with_urea_price(
        &self,
        location: LocationId,
        price: f64,
    ) -> Result<ParameterSet, ValidationError> {
        let key = self.location(location).code().to_string();
        check_magnitude("urea_price", &key, price)?;
        let mut next = self.clone();
        next.urea_price[location.value()] = price;
        Ok(next)
    }

    /// Restrict the set to the locations matching `filter`, re-indexing them in
    /// their original order. Sources and routes are kept as they are.
    pub fn filter_locations(&self, filter: &LocationFilter) -> Result<ParameterSet, ValidationError> {
        let kept: Vec<usize> = self
            .locations
            .iter()
            .filter(|l| filter.matches(&l.info))
            .map(|l| l.id.value())
            .collect();

        if kept.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        let n_old = self.locations.len();
        let n = kept.len();
        let locations = kept
            .iter()
            .enumerate()
            .map(|(new, &old)| Location {
                id: LocationId::new(new),
                info: self.locations[old].info.clone(),
            })
            .collect();

        let per_source = |table: &[f64]| -> Vec<f64> {
            let mut out = Vec::with_capacity(self.sources.len() * n);
            for s in 0..self.sources.len() {
                out.extend(kept.iter().map(|&old| table[s * n_old + old]));
            }
            out
        };

        let mut distance = Vec::with_capacity(n * n);
        for &i in &kept {
            distance.extend(kept.iter().map(|&j| self.distance[i * n_old + j]));
        }

        Ok(ParameterSet {
            locations,
            sources: self.sources.clone(),
            routes: self.routes.clone(),
            supply: per_source(&self.supply),
            price: per_source(&self.price),
            demand: kept.iter().map(|&i| self.demand[i]).collect(),
            urea_price: kept.iter().map(|&i| self.urea_price[i]).collect(),
            distance,
            conversion: self.conversion.clone(),
            utility: self.utility.clone(),
        })
    }
}

/// Incremental constructor for [`ParameterSet`].
///
/// Declare locations, sources and routes first; the returned IDs key the
/// table setters. Setting the same entry twice keeps the last value.
#[derive(Debug, Default, Clone)]
pub struct ParameterSetBuilder {
    locations: Vec<LocationInfo>,
    sources: Vec<(String, SourceKind)>,
    routes: Vec<String>,
    supply: HashMap<(SourceId, LocationId), f64>,
    price: HashMap<(SourceId, LocationId), f64>,
    demand: HashMap<LocationId, f64>,
    urea_price: HashMap<LocationId, f64>,
    distance: HashMap<(LocationId, LocationId), f64>,
    conversion: HashMap<(SourceId, RouteId), f64>,
    utility: HashMap<(SourceId, RouteId), f64>,
    self_distance: Option<f64>,
}

impl ParameterSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&mut self, info: LocationInfo) -> LocationId {
        self.locations.push(info);
        LocationId::new(self.locations.len() - 1)
    }

    pub fn source(&mut self, name: impl Into<String>, kind: SourceKind) -> SourceId {
        self.sources.push((name.into(), kind));
        SourceId::new(self.sources.len() - 1)
    }

    pub fn route(&mut self, name: impl Into<String>) -> RouteId {
        self.routes.push(name.into());
        RouteId::new(self.routes.len() - 1)
    }

    pub fn location_by_code(&self, code: &str) -> Option<LocationId> {
        self.locations
            .iter()
            .position(|l| l.code == code)
            .map(LocationId::new)
    }

    pub fn location_ids(&self) -> impl Iterator<Item = LocationId> {
        (0..self.locations.len()).map(LocationId::new)
    }

    pub fn supply(&mut self, source: SourceId, location: LocationId, value: f64) -> &mut Self {
        self.supply.insert((source, location), value);
        self
    }

    pub fn price(&mut self, source: SourceId, location: LocationId, value: f64) -> &mut Self {
        self.price.insert((source, location), value);
        self
    }

    pub fn demand(&mut self, location: LocationId, value: f64) -> &mut Self {
        self.demand.insert(location, value);
        self
    }

    pub fn urea_price(&mut self, location: LocationId, value: f64) -> &mut Self {
        self.urea_price.insert(location, value);
        self
    }

    /// Distance between two locations. One direction is enough; if both are
    /// given they must agree.
    pub fn distance(&mut self, from: LocationId, to: LocationId, value: f64) -> &mut Self {
        self.distance.insert((from, to), value);
        self
    }

    /// Intra-location transport distance applied to every diagonal entry.
    pub fn self_distance(&mut self, value: f64) -> &mut Self {
        self.self_distance = Some(value);
        self
    }

    pub fn conversion_yield(&mut self, source: SourceId, route: RouteId, value: f64) -> &mut Self {
        self.conversion.insert((source, route), value);
        self
    }

    /// Setting any utility yield declares the utility table, which must then
    /// be complete.
    pub fn utility_yield(&mut self, source: SourceId, route: RouteId, value: f64) -> &mut Self {
        self.utility.insert((source, route), value);
        self
    }

    pub fn build(self) -> Result<ParameterSet, ValidationError> {
        if self.locations.is_empty() {
            return Err(ValidationError::EmptySet("locations"));
        }
        if self.sources.is_empty() {
            return Err(ValidationError::EmptySet("sources"));
        }
        if self.routes.is_empty() {
            return Err(ValidationError::EmptySet("routes"));
        }

        check_unique("location", self.locations.iter().map(|l| l.code.as_str()))?;
        check_unique("source", self.sources.iter().map(|(n, _)| n.as_str()))?;
        check_unique("route", self.routes.iter().map(|r| r.as_str()))?;

        let locations: Vec<Location> = self
            .locations
            .iter()
            .enumerate()
            .map(|(i, info)| Location {
                id: LocationId::new(i),
                info: info.clone(),
            })
            .collect();
        let sources: Vec<Source> = self
            .sources
            .iter()
            .enumerate()
            .map(|(i, (name, kind))| Source {
                id: SourceId::new(i),
                name: name.clone(),
                kind: *kind,
            })
            .collect();
        let routes: Vec<Route> = self
            .routes
            .iter()
            .enumerate()
            .map(|(i, name)| Route {
                id: RouteId::new(i),
                name: name.clone(),
            })
            .collect();

        let source_location_key =
            |s: &Source, l: &Location| format!("{} @ {}", s.name, l.code());
        let source_route_key = |s: &Source, r: &Route| format!("{} via {}", s.name, r.name);

        let mut supply = Vec::with_capacity(sources.len() * locations.len());
        let mut price = Vec::with_capacity(sources.len() * locations.len());
        for s in &sources {
            for l in &locations {
                let key = source_location_key(s, l);
                supply.push(require("supply", &key, self.supply.get(&(s.id, l.id)))?);
                price.push(require("price", &key, self.price.get(&(s.id, l.id)))?);
            }
        }

        let mut demand = Vec::with_capacity(locations.len());
        let mut urea_price = Vec::with_capacity(locations.len());
        for l in &locations {
            demand.push(require("demand", l.code(), self.demand.get(&l.id))?);
            urea_price.push(require("urea_price", l.code(), self.urea_price.get(&l.id))?);
        }

        let distance = self.distance_matrix(&locations)?;

        let mut conversion = Vec::with_capacity(sources.len() * routes.len());
        for s in &sources {
            for r in &routes {
                let key = source_route_key(s, r);
                conversion.push(require("conversion_yield", &key, self.conversion.get(&(s.id, r.id)))?);
            }
        }

        let utility = if self.utility.is_empty() {
            None
        } else {
            let mut table = Vec::with_capacity(sources.len() * routes.len());
            for s in &sources {
                for r in &routes {
                    let key = source_route_key(s, r);
                    table.push(require("utility_yield", &key, self.utility.get(&(s.id, r.id)))?);
                }
            }
            Some(table)
        };

        Ok(ParameterSet {
            locations,
            sources,
            routes,
            supply,
            price,
            demand,
            urea_price,
            distance,
            conversion,
            utility,
        })
    }

    fn distance_matrix(&self, locations: &[Location]) -> Result<Vec<f64>, ValidationError> {
        let n = locations.len();
        let mut matrix = vec![0.0; n * n];

        for a in locations {
            let i = a.id.value();

            let diagonal = match self.self_distance {
                Some(d) => d,
                None => require("distance", &pair_key(a, a), self.distance.get(&(a.id, a.id)))?,
            };
            check_magnitude("distance", &pair_key(a, a), diagonal)?;
            if diagonal <= 0.0 {
                return Err(ValidationError::NonPositiveSelfDistance {
                    location: a.code().to_string(),
                    value: diagonal,
                });
            }
            matrix[i * n + i] = diagonal;

            for b in &locations[i + 1..] {
                let j = b.id.value();
                let forward = self.distance.get(&(a.id, b.id)).copied();
                let backward = self.distance.get(&(b.id, a.id)).copied();
                let value = match (forward, backward) {
                    (Some(f), Some(r)) => {
                        let scale = f.abs().max(r.abs()).max(1.0);
                        if (f - r).abs() > SYMMETRY_TOLERANCE * scale {
                            return Err(ValidationError::AsymmetricDistance {
                                from: a.code().to_string(),
                                to: b.code().to_string(),
                                forward: f,
                                backward: r,
                            });
                        }
                        f
                    }
                    (Some(v), None) | (None, Some(v)) => v,
                    (None, None) => {
                        return Err(ValidationError::MissingEntry {
                            table: "distance",
                            key: pair_key(a, b),
                        })
                    }
                };
                check_magnitude("distance", &pair_key(a, b), value)?;
                matrix[i * n + j] = value;
                matrix[j * n + i] = value;
            }
        }

        Ok(matrix)
    }
}

fn pair_key(a: &Location, b: &Location) -> String {
    format!("{} -> {}", a.code(), b.code())
}

fn require(table: &'static str, key: &str, value: Option<&f64>) -> Result<f64, ValidationError> {
    let value = *value.ok_or_else(|| ValidationError::MissingEntry {
        table,
        key: key.to_string(),
    })?;
    check_magnitude(table, key, value)?;
    Ok(value)
}

fn check_magnitude(table: &'static str, key: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            table,
            key: key.to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue {
            table,
            key: key.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ValidationError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two locations, one biomass source, one route, all tables filled.
    fn two_site_builder() -> (ParameterSetBuilder, LocationId, LocationId, SourceId, RouteId) {
        let mut b = ParameterSet::builder();
        let l1 = b.location(LocationInfo::new("A", "Alpha").with_type("microregion"));
        let l2 = b.location(LocationInfo::new("B", "Beta").with_type("state"));
        let s = b.source("corn_stover", SourceKind::Biomass);
        let r = b.route("Air mixed gasification");
        b.self_distance(100.0)
            .distance(l1, l2, 300.0)
            .supply(s, l1, 100.0)
            .supply(s, l2, 0.0)
            .price(s, l1, 10.0)
            .price(s, l2, 20.0)
            .demand(l1, 0.0)
            .demand(l2, 50.0)
            .urea_price(l1, 400.0)
            .urea_price(l2, 450.0)
            .conversion_yield(s, r, 0.81);
        (b, l1, l2, s, r)
    }

    #[test]
    fn test_lookups_are_total() {
        let (b, l1, l2, s, r) = two_site_builder();
        let params = b.build().unwrap();

        assert_eq!(params.supply(s, l1), 100.0);
        assert_eq!(params.price(s, l2), 20.0);
        assert_eq!(params.demand(l2), 50.0);
        assert_eq!(params.urea_price(l1), 400.0);
        assert_eq!(params.conversion_yield(s, r), 0.81);
        assert_eq!(params.utility_yield(s, r), 0.0);
        assert!(!params.has_utility_yields());
        assert_eq!(params.total_demand(), 50.0);
        assert_eq!(params.total_supply(s), 100.0);
    }

    #[test]
    fn test_distance_is_mirrored_and_diagonal_filled() {
        let (b, l1, l2, _, _) = two_site_builder();
        let params = b.build().unwrap();

        assert_eq!(params.distance(l1, l2), 300.0);
        assert_eq!(params.distance(l2, l1), 300.0);
        assert_eq!(params.distance(l1, l1), 100.0);
        assert_eq!(params.distance(l2, l2), 100.0);
        assert_eq!(params.max_distance(), 300.0);
    }

    #[test]
    fn test_asymmetric_distance_rejected() {
        let (mut b, l1, l2, _, _) = two_site_builder();
        b.distance(l2, l1, 301.0);
        let err = b.build().unwrap_err();
        assert!(matches!(err, ValidationError::AsymmetricDistance { .. }));
        assert!(err.to_string().contains("A -> B"));
    }

    #[test]
    fn test_missing_entry_names_key() {
        let mut b = ParameterSet::builder();
        let l1 = b.location(LocationInfo::new("A", "Alpha"));
        let s = b.source("rice_husk", SourceKind::Biomass);
        let r = b.route("Electrolysis");
        b.self_distance(100.0)
            .supply(s, l1, 1.0)
            .demand(l1, 1.0)
            .urea_price(l1, 1.0)
            .conversion_yield(s, r, 0.0);

        let err = b.build().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingEntry {
                table: "price",
                key: "rice_husk @ A".into()
            }
        );
    }

    #[test]
    fn test_negative_value_rejected() {
        let (mut b, _, l2, s, _) = two_site_builder();
        b.supply(s, l2, -1.0);
        let err = b.build().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NegativeValue { table: "supply", value, .. } if value == -1.0
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let (mut b, l1, _, _, _) = two_site_builder();
        b.urea_price(l1, f64::NAN);
        assert!(matches!(
            b.build().unwrap_err(),
            ValidationError::NonFinite { table: "urea_price", .. }
        ));
    }

    #[test]
    fn test_diagonal_required_without_self_distance() {
        let mut b = ParameterSet::builder();
        let l1 = b.location(LocationInfo::new("A", "Alpha"));
        let s = b.source("rice_husk", SourceKind::Biomass);
        let r = b.route("Electrolysis");
        b.supply(s, l1, 1.0)
            .price(s, l1, 1.0)
            .demand(l1, 1.0)
            .urea_price(l1, 1.0)
            .conversion_yield(s, r, 0.0);

        assert!(matches!(
            b.clone().build().unwrap_err(),
            ValidationError::MissingEntry { table: "distance", .. }
        ));

        b.distance(l1, l1, 0.0);
        assert!(matches!(
            b.clone().build().unwrap_err(),
            ValidationError::NonPositiveSelfDistance { .. }
        ));

        b.distance(l1, l1, 25.0);
        assert_eq!(b.build().unwrap().distance(l1, l1), 25.0);
    }

    #[test]
    fn test_duplicate_location_rejected() {
        let (mut b, _, _, _, _) = two_site_builder();
        b.location(LocationInfo::new("A", "Again"));
        assert_eq!(
            b.build().unwrap_err(),
            ValidationError::Duplicate {
                kind: "location",
                name: "A".into()
            }
        );
    }

    #[test]
    fn test_partial_utility_table_rejected() {
        let mut b = ParameterSet::builder();
        let l1 = b.location(LocationInfo::new("A", "Alpha"));
        let husk = b.source("rice_husk", SourceKind::Biomass);
        let grid = b.source("grid", SourceKind::Power);
        let r = b.route("Electrolysis");
        b.self_distance(10.0).demand(l1, 1.0).urea_price(l1, 1.0);
        for s in [husk, grid] {
            b.supply(s, l1, 1.0).price(s, l1, 1.0).conversion_yield(s, r, 0.5);
        }
        b.utility_yield(husk, r, 0.2);

        assert!(matches!(
            b.clone().build().unwrap_err(),
            ValidationError::MissingEntry { table: "utility_yield", .. }
        ));

        b.utility_yield(grid, r, 0.0);
        let params = b.build().unwrap();
        assert!(params.has_utility_yields());
        assert_eq!(params.utility_yield(husk, r), 0.2);
    }

    #[test]
    fn test_filter_reindexes_tables() {
        let (b, _, _, s, _) = two_site_builder();
        let params = b.build().unwrap();

        let only_states = params
            .filter_locations(&LocationFilter::all().with_location_type("state"))
            .unwrap();
        assert_eq!(only_states.num_locations(), 1);

        let beta = only_states.location_by_code("B").unwrap();
        assert_eq!(beta.value(), 0);
        assert_eq!(only_states.price(s, beta), 20.0);
        assert_eq!(only_states.demand(beta), 50.0);
        assert_eq!(only_states.distance(beta, beta), 100.0);
    }

    #[test]
    fn test_filter_with_no_match() {
        let (b, _, _, _, _) = two_site_builder();
        let params = b.build().unwrap();
        assert_eq!(
            params
                .filter_locations(&LocationFilter::all().with_region("Nowhere"))
                .unwrap_err(),
            ValidationError::EmptySelection
        );
    }

    #[test]
    fn test_with_urea_price_copies() {
        let (b, l1, _, _, _) = two_site_builder();
        let params = b.build().unwrap();
        let raised = params.with_urea_price(l1, 900.0).unwrap();
        assert_eq!(raised.urea_price(l1), 900.0);
        assert_eq!(params.urea_price(l1), 400.0);
        assert!(params.with_urea_price(l1, -1.0).is_err());
    }
}
