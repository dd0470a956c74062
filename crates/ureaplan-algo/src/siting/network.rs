//! Multi-commodity flow network
//!
//! Every ordered pair of locations is an edge, so any location may ship any
//! source or urea to any other. Variables are stored densely:
//!
//! ```text
//! sold[s][from][to]      source s shipped between locations
//! used[s][r][l]          source s fed to route r at l
//! produced[r][l]         urea made by route r at l
//! urea_sold[from][to]    urea shipped between locations
//! utility_used[r][l]     auxiliary utility at l (only with a utility table)
//! ```

use super::model::{ConstraintFamily, TaggedConstraint};
use good_lp::{constraint, variable, Expression, ProblemVariables, Variable};
use ureaplan_core::{LocationId, ParameterSet, RouteId, SourceId};

/// Flow decision variables over the dense all-pairs network.
#[derive(Debug, Clone)]
pub struct FlowVariables {
    n_locations: usize,
    n_sources: usize,
    n_routes: usize,
    sold: Vec<Variable>,
    used: Vec<Variable>,
    produced: Vec<Variable>,
    urea_sold: Vec<Variable>,
    utility_used: Option<Vec<Variable>>,
}

impl FlowVariables {
    pub fn declare(vars: &mut ProblemVariables, params: &ParameterSet) -> Self {
        let n = params.num_locations();
        let ns = params.num_sources();
        let nr = params.num_routes();

        // Each shipment is bounded by what its origin can offer or its
        // destination can absorb; the explicit rows below still carry the
        // aggregate limits.
        let mut sold = Vec::with_capacity(ns * n * n);
        for s in params.source_ids() {
            for from in params.location_ids() {
                let cap = params.supply(s, from);
                for _ in 0..n {
                    sold.push(vars.add(variable().min(0.0).max(cap)));
                }
            }
        }

        let used = vars.add_vector(variable().min(0.0), ns * nr * n);
        let produced = vars.add_vector(variable().min(0.0), nr * n);

        let mut urea_sold = Vec::with_capacity(n * n);
        for _ in 0..n {
            for to in params.location_ids() {
                urea_sold.push(vars.add(variable().min(0.0).max(params.demand(to))));
            }
        }

        let utility_used = params
            .has_utility_yields()
            .then(|| vars.add_vector(variable().min(0.0), nr * n));

        Self {
            n_locations: n,
            n_sources: ns,
            n_routes: nr,
            sold,
            used,
            produced,
            urea_sold,
            utility_used,
        }
    }

    /// Number of declared flow variables.
    pub fn len(&self) -> usize {
        self.sold.len()
            + self.used.len()
            + self.produced.len()
            + self.urea_sold.len()
            + self.utility_used.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sold(&self, s: SourceId, from: LocationId, to: LocationId) -> Variable {
        let n = self.n_locations;
        self.sold[(s.value() * n + from.value()) * n + to.value()]
    }

    pub fn used(&self, s: SourceId, r: RouteId, l: LocationId) -> Variable {
        let n = self.n_locations;
        self.used[(s.value() * self.n_routes + r.value()) * n + l.value()]
    }

    pub fn produced(&self, r: RouteId, l: LocationId) -> Variable {
        self.produced[r.value() * self.n_locations + l.value()]
    }

    pub fn urea_sold(&self, from: LocationId, to: LocationId) -> Variable {
        self.urea_sold[from.value() * self.n_locations + to.value()]
    }

    pub fn utility_used(&self, r: RouteId, l: LocationId) -> Option<Variable> {
        self.utility_used
            .as_ref()
            .map(|u| u[r.value() * self.n_locations + l.value()])
    }

    pub fn has_utility(&self) -> bool {
        self.utility_used.is_some()
    }

    /// `Σ_r produced[r, l]`
    pub fn production_at(&self, l: LocationId) -> Expression {
        (0..self.n_routes)
            .map(|r| self.produced(RouteId::new(r), l))
            .sum()
    }

    /// `Σ_{r, l} produced[r, l]`
    pub fn total_production(&self) -> Expression {
        self.produced.iter().copied().sum()
    }

    /// Conversion, utility, balance and limit rows of the network.
    pub fn constraints(&self, params: &ParameterSet) -> Vec<TaggedConstraint> {
        let n = self.n_locations;
        let mut out = Vec::new();

        for r in params.route_ids() {
            for l in params.location_ids() {
                // produced[r, l] == Σ_s used[s, r, l] · conversion_yield(s, r)
                let converted: Expression = params
                    .source_ids()
                    .map(|s| params.conversion_yield(s, r) * self.used(s, r, l))
                    .sum();
                out.push(TaggedConstraint::new(
                    ConstraintFamily::ConversionRatio,
                    constraint!(self.produced(r, l) == converted),
                ));

                if let Some(utility) = self.utility_used(r, l) {
                    let auxiliary: Expression = params
                        .source_ids()
                        .map(|s| params.utility_yield(s, r) * self.used(s, r, l))
                        .sum();
                    out.push(TaggedConstraint::new(
                        ConstraintFamily::UtilityRatio,
                        constraint!(utility == auxiliary),
                    ));
                }
            }
        }

        for s in params.source_ids() {
            for l in params.location_ids() {
                let consumed: Expression = params.route_ids().map(|r| self.used(s, r, l)).sum();
                let inbound: Expression = params.location_ids().map(|from| self.sold(s, from, l)).sum();
                out.push(TaggedConstraint::new(
                    ConstraintFamily::SourceBalance,
                    constraint!(consumed == inbound),
                ));

                let outbound: Expression = params.location_ids().map(|to| self.sold(s, l, to)).sum();
                out.push(TaggedConstraint::new(
                    ConstraintFamily::SupplyLimit,
                    constraint!(outbound <= params.supply(s, l)),
                ));
            }
        }

        for l in params.location_ids() {
            let shipped: Expression = params.location_ids().map(|to| self.urea_sold(l, to)).sum();
            out.push(TaggedConstraint::new(
                ConstraintFamily::UreaBalance,
                constraint!(self.production_at(l) == shipped),
            ));

            let received: Expression = params.location_ids().map(|from| self.urea_sold(from, l)).sum();
            out.push(TaggedConstraint::new(
                ConstraintFamily::DemandLimit,
                constraint!(received <= params.demand(l)),
            ));
        }

        debug_assert_eq!(
            out.len(),
            self.n_routes * n * (1 + self.has_utility() as usize) + 2 * self.n_sources * n + 2 * n
        );
        out
    }
}
