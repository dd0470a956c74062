//! Location subset selection.
//!
//! Runs usually study one slice of the location table (all microregions, one
//! region, a handful of states). A [`LocationFilter`] describes that slice; an
//! empty list places no restriction on its attribute.

use crate::LocationInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationFilter {
    pub location_types: Vec<String>,
    pub regions: Vec<String>,
    pub states: Vec<String>,
    /// Explicit location codes
    pub codes: Vec<String>,
}

impl LocationFilter {
    /// A filter that keeps every location.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_location_type(mut self, location_type: impl Into<String>) -> Self {
        self.location_types.push(location_type.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.regions.push(region.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.states.push(state.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.codes.push(code.into());
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.location_types.is_empty()
            && self.regions.is_empty()
            && self.states.is_empty()
            && self.codes.is_empty()
    }

    pub fn matches(&self, info: &LocationInfo) -> bool {
        fn allowed(list: &[String], value: &str) -> bool {
            list.is_empty() || list.iter().any(|v| v == value)
        }

        allowed(&self.location_types, &info.location_type)
            && allowed(&self.regions, &info.region)
            && allowed(&self.states, &info.state)
            && allowed(&self.codes, &info.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(code: &str, kind: &str, region: &str, state: &str) -> LocationInfo {
        LocationInfo::new(code, code)
            .with_type(kind)
            .with_region(region, state)
    }

    #[test]
    fn test_unrestricted_matches_everything() {
        let filter = LocationFilter::all();
        assert!(filter.is_unrestricted());
        assert!(filter.matches(&info("1", "state", "South", "PR")));
    }

    #[test]
    fn test_attributes_combine_with_and() {
        let filter = LocationFilter::all()
            .with_location_type("microregion")
            .with_region("Southeast");

        assert!(filter.matches(&info("1", "microregion", "Southeast", "SP")));
        assert!(!filter.matches(&info("2", "microregion", "South", "PR")));
        assert!(!filter.matches(&info("3", "state", "Southeast", "SP")));
    }

    #[test]
    fn test_values_within_attribute_combine_with_or() {
        let filter = LocationFilter::all().with_state("SP").with_state("MG");
        assert!(filter.matches(&info("1", "microregion", "Southeast", "MG")));
        assert!(!filter.matches(&info("2", "microregion", "Southeast", "RJ")));
    }
}
