//! Siting problem data structures
//!
//! Bundles the validated parameter tables with the economic assumptions and
//! the capacity plan that together define one optimization run.

use serde::{Deserialize, Serialize};
use ureaplan_core::{CapacityPlan, CapexCurve, ModelConsistencyError, ParameterSet};

/// Which location's feedstock price applies to a unit of feedstock.
///
/// The two readings disagree whenever feedstock is bought at one location and
/// burned at another, so the choice is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedstockPricing {
    /// `used[s, r, l]` priced at `price(s, l)`, the plant location
    #[default]
    AtConsumption,
    /// `sold[s, l1, l2]` priced at `price(s, l1)`, the supplying location
    AtOrigin,
}

/// Cash-flow assumptions for the NPV objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Economics {
    pub discount_rate: f64,
    /// Planning horizon (years)
    pub horizon_years: u32,
    /// Plant operating hours per year; links hourly capacity to yearly output
    pub yearly_hours: f64,
    /// Flat price of one truck trip per unit distance
    pub price_per_trip: f64,
    /// Truck payload (mass units per trip)
    pub vehicle_capacity: f64,
    pub feedstock_pricing: FeedstockPricing,
}

impl Default for Economics {
    fn default() -> Self {
        Self {
            discount_rate: 0.10,
            horizon_years: 20,
            yearly_hours: 8300.0,
            price_per_trip: 6.36,
            vehicle_capacity: 60.0, // bi-train truck
            feedstock_pricing: FeedstockPricing::AtConsumption,
        }
    }
}

impl Economics {
    /// Transport price per unit distance per unit mass.
    pub fn transport_rate(&self) -> f64 {
        self.price_per_trip / self.vehicle_capacity
    }

    /// Present value of one unit of cash flow received at the end of each
    /// year of the horizon: Σ_{t=1..T} (1+r)^-t
    pub fn annuity_factor(&self) -> f64 {
        let r = self.discount_rate;
        let n = self.horizon_years as f64;
        if r.abs() < 1e-12 {
            n
        } else {
            (1.0 - (1.0 + r).powf(-n)) / r
        }
    }

    pub fn validate(&self) -> Result<(), ModelConsistencyError> {
        let fail = |msg: String| Err(ModelConsistencyError::InvalidEconomics(msg));
        if !self.discount_rate.is_finite() || self.discount_rate <= -1.0 {
            return fail(format!("discount rate {} must exceed -1", self.discount_rate));
        }
        if self.horizon_years == 0 {
            return fail("horizon must be at least one year".into());
        }
        if !self.yearly_hours.is_finite() || self.yearly_hours <= 0.0 {
            return fail(format!("yearly hours {} must be positive", self.yearly_hours));
        }
        if !self.vehicle_capacity.is_finite() || self.vehicle_capacity <= 0.0 {
            return fail(format!(
                "vehicle capacity {} must be positive",
                self.vehicle_capacity
            ));
        }
        if !self.price_per_trip.is_finite() || self.price_per_trip < 0.0 {
            return fail(format!(
                "price per trip {} must be non-negative",
                self.price_per_trip
            ));
        }
        Ok(())
    }
}

/// Siting problem definition
#[derive(Debug, Clone)]
pub struct SitingProblem {
    pub params: ParameterSet,
    pub plan: CapacityPlan,
    pub economics: Economics,
    /// Big-M for the production-siting link. Derived from the model bounds
    /// when `None`; an explicit value must not be below the derived bound.
    pub big_m: Option<f64>,
}

impl SitingProblem {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            params,
            plan: CapacityPlan::default(),
            economics: Economics::default(),
            big_m: None,
        }
    }

    pub fn with_plan(mut self, plan: CapacityPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_economics(mut self, economics: Economics) -> Self {
        self.economics = economics;
        self
    }

    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = Some(big_m);
        self
    }

    /// The CAPEX curve seen by the linearizer.
    pub fn capex_curve(&self) -> Result<CapexCurve, ModelConsistencyError> {
        self.plan.curve()
    }

    pub fn num_locations(&self) -> usize {
        self.params.num_locations()
    }

    /// Largest yearly production any feasible solution can reach: bounded by
    /// the largest installable capacity and by the total demand.
    pub fn max_yearly_production(&self) -> Result<f64, ModelConsistencyError> {
        let curve = self.capex_curve()?;
        let by_capacity = curve.max_capacity() * self.economics.yearly_hours;
        Ok(by_capacity.min(self.params.total_demand()))
    }
}

/// Builder for constructing siting problems
pub struct SitingProblemBuilder {
    problem: SitingProblem,
}

impl SitingProblemBuilder {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            problem: SitingProblem::new(params),
        }
    }

    pub fn capex_curve(mut self, curve: CapexCurve) -> Self {
        self.problem.plan = CapacityPlan::Sized(curve);
        self
    }

    pub fn fixed_capacity(mut self, capacity: f64, capex: f64) -> Self {
        self.problem.plan = CapacityPlan::Fixed { capacity, capex };
        self
    }

    pub fn economics(mut self, economics: Economics) -> Self {
        self.problem.economics = economics;
        self
    }

    pub fn discounting(mut self, discount_rate: f64, horizon_years: u32) -> Self {
        self.problem.economics.discount_rate = discount_rate;
        self.problem.economics.horizon_years = horizon_years;
        self
    }

    pub fn yearly_hours(mut self, hours: f64) -> Self {
        self.problem.economics.yearly_hours = hours;
        self
    }

    pub fn transport(mut self, price_per_trip: f64, vehicle_capacity: f64) -> Self {
        self.problem.economics.price_per_trip = price_per_trip;
        self.problem.economics.vehicle_capacity = vehicle_capacity;
        self
    }

    pub fn feedstock_pricing(mut self, pricing: FeedstockPricing) -> Self {
        self.problem.economics.feedstock_pricing = pricing;
        self
    }

    pub fn big_m(mut self, big_m: f64) -> Self {
        self.problem.big_m = Some(big_m);
        self
    }

    pub fn build(self) -> SitingProblem {
        self.problem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ureaplan_core::{LocationInfo, SourceKind};

    fn one_site() -> ParameterSet {
        let mut b = ParameterSet::builder();
        let l = b.location(LocationInfo::new("A", "Alpha"));
        let s = b.source("rice_husk", SourceKind::Biomass);
        let r = b.route("Pure oxygen gasification");
        b.self_distance(100.0)
            .supply(s, l, 10.0)
            .price(s, l, 1.0)
            .demand(l, 500.0)
            .urea_price(l, 2.0)
            .conversion_yield(s, r, 0.81);
        b.build().unwrap()
    }

    #[test]
    fn test_annuity_factor() {
        let eco = Economics::default();
        // 10% over 20 years
        assert!((eco.annuity_factor() - 8.513564).abs() < 1e-5);

        let flat = Economics {
            discount_rate: 0.0,
            horizon_years: 5,
            ..Economics::default()
        };
        assert_eq!(flat.annuity_factor(), 5.0);

        let one_year = Economics {
            discount_rate: 0.25,
            horizon_years: 1,
            ..Economics::default()
        };
        assert!((one_year.annuity_factor() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_transport_rate() {
        let eco = Economics::default();
        assert!((eco.transport_rate() - 0.106).abs() < 1e-12);
    }

    #[test]
    fn test_economics_validation() {
        assert!(Economics::default().validate().is_ok());

        let bad = Economics {
            vehicle_capacity: 0.0,
            ..Economics::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ModelConsistencyError::InvalidEconomics(_))
        ));

        let bad = Economics {
            horizon_years: 0,
            ..Economics::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_builder_sets_fields() {
        let problem = SitingProblemBuilder::new(one_site())
            .fixed_capacity(20.0, 100.0)
            .discounting(0.08, 15)
            .yearly_hours(8000.0)
            .transport(5.0, 50.0)
            .feedstock_pricing(FeedstockPricing::AtOrigin)
            .big_m(1e6)
            .build();

        assert_eq!(
            problem.plan,
            CapacityPlan::Fixed {
                capacity: 20.0,
                capex: 100.0
            }
        );
        assert_eq!(problem.economics.horizon_years, 15);
        assert_eq!(problem.economics.feedstock_pricing, FeedstockPricing::AtOrigin);
        assert_eq!(problem.economics.transport_rate(), 0.1);
        assert_eq!(problem.big_m, Some(1e6));
    }

    #[test]
    fn test_max_yearly_production_bounded_by_demand() {
        let problem = SitingProblem::new(one_site());
        // 80 t/h * 8300 h far exceeds the 500 t demand
        assert_eq!(problem.max_yearly_production().unwrap(), 500.0);

        let small = SitingProblemBuilder::new(one_site())
            .fixed_capacity(0.05, 1.0)
            .yearly_hours(1000.0)
            .build();
        assert!((small.max_yearly_production().unwrap() - 50.0).abs() < 1e-9);
    }
}
