//! Single-plant siting disjunction and the NPV objective

use super::capex::CapexVariables;
use super::model::{ConstraintFamily, TaggedConstraint};
use super::network::FlowVariables;
use super::problem::{FeedstockPricing, SitingProblem};
use good_lp::{constraint, variable, Expression, ProblemVariables, Variable};
use ureaplan_core::LocationId;

/// One binary per candidate location.
#[derive(Debug, Clone)]
pub struct SitingVariables {
    pub plant_installed: Vec<Variable>,
}

impl SitingVariables {
    pub fn declare(vars: &mut ProblemVariables, n_locations: usize) -> Self {
        Self {
            plant_installed: vars.add_vector(variable().binary(), n_locations),
        }
    }

    pub fn installed(&self, l: LocationId) -> Variable {
        self.plant_installed[l.value()]
    }

    /// Exactly one plant, and no production where no plant stands.
    pub fn constraints(&self, flows: &FlowVariables, big_m: f64) -> Vec<TaggedConstraint> {
        let mut out = Vec::with_capacity(self.plant_installed.len() + 1);

        let plants: Expression = self.plant_installed.iter().copied().sum();
        out.push(TaggedConstraint::new(
            ConstraintFamily::PlantLocationLimit,
            constraint!(plants == 1.0),
        ));

        for (i, &y) in self.plant_installed.iter().enumerate() {
            let production = flows.production_at(LocationId::new(i));
            out.push(TaggedConstraint::new(
                ConstraintFamily::PlantProductionLimit,
                constraint!(production <= big_m * y),
            ));
        }

        out
    }

    /// Yearly production equals installed capacity run for the operating hours.
    pub fn capacity_link(
        &self,
        flows: &FlowVariables,
        capex: &CapexVariables,
        yearly_hours: f64,
    ) -> TaggedConstraint {
        let total = flows.total_production();
        TaggedConstraint::new(
            ConstraintFamily::CapacityLink,
            constraint!(total == yearly_hours * capex.capacity),
        )
    }
}

/// Linear expressions for every term of the NPV, kept apart so the solution
/// can report each one.
#[derive(Debug, Clone)]
pub struct NpvTerms {
    pub revenue: Expression,
    pub feedstock_cost: Expression,
    pub feedstock_transport_cost: Expression,
    pub product_transport_cost: Expression,
    pub capex: Expression,
    pub annuity_factor: f64,
}

impl NpvTerms {
    pub fn build(problem: &SitingProblem, flows: &FlowVariables, capex: &CapexVariables) -> Self {
        let params = &problem.params;
        let rate = problem.economics.transport_rate();

        let mut revenue = Expression::from(0.0);
        let mut product_transport_cost = Expression::from(0.0);
        for from in params.location_ids() {
            for to in params.location_ids() {
                let shipped = flows.urea_sold(from, to);
                revenue += params.urea_price(to) * shipped;
                product_transport_cost += rate * params.distance(from, to) * shipped;
            }
        }

        let mut feedstock_cost = Expression::from(0.0);
        let mut feedstock_transport_cost = Expression::from(0.0);
        for source in params.sources() {
            let s = source.id;
            for from in params.location_ids() {
                for to in params.location_ids() {
                    let shipped = flows.sold(s, from, to);
                    if source.kind.is_trucked() {
                        feedstock_transport_cost += rate * params.distance(from, to) * shipped;
                    }
                    if problem.economics.feedstock_pricing == FeedstockPricing::AtOrigin {
                        feedstock_cost += params.price(s, from) * shipped;
                    }
                }
            }
            if problem.economics.feedstock_pricing == FeedstockPricing::AtConsumption {
                for r in params.route_ids() {
                    for l in params.location_ids() {
                        feedstock_cost += params.price(s, l) * flows.used(s, r, l);
                    }
                }
            }
        }

        Self {
            revenue,
            feedstock_cost,
            feedstock_transport_cost,
            product_transport_cost,
            capex: Expression::from(capex.capex),
            annuity_factor: problem.economics.annuity_factor(),
        }
    }

    /// Yearly cash flow: revenue minus feedstock and both transport costs.
    pub fn cash_flow(&self) -> Expression {
        self.revenue.clone()
            - self.feedstock_cost.clone()
            - self.feedstock_transport_cost.clone()
            - self.product_transport_cost.clone()
    }

    /// `annuity_factor · cash_flow − capex`
    pub fn npv(&self) -> Expression {
        self.annuity_factor * self.cash_flow() - self.capex.clone()
    }
}
