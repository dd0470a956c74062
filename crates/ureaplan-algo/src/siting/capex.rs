//! Piecewise CAPEX linearization
//!
//! Encodes "exactly one of K linear regimes is active". Each regime owns one
//! binary and its own pair of slack constants, derived from the curve's
//! domain so that a deactivated regime never cuts off a point another regime
//! allows.
//!
//! ```text
//! Σ_i z_i = 1
//! capacity ≥ lo_i − Sc⁻_i·(1 − z_i)
//! capacity ≤ hi_i + Sc⁺_i·(1 − z_i)
//! capex    ≥ a_i + b_i·(capacity − lo_i) − Sk_i·(1 − z_i)
//! capex    ≤ a_i + b_i·(capacity − lo_i) + Sk_i·(1 − z_i)
//! ```
//!
//! All inequalities are non-strict, so a capacity on a shared boundary is
//! feasible under either neighbouring regime.

use super::model::{ConstraintFamily, TaggedConstraint};
use good_lp::{constraint, variable, Expression, ProblemVariables, Variable};
use serde::{Deserialize, Serialize};
use ureaplan_core::{CapacitySegment, CapexCurve};

/// One linear regime of the CAPEX curve together with its derived slacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapexRegime {
    pub index: usize,
    pub segment: CapacitySegment,
    /// Relaxation of the lower capacity bound when inactive: `lo_i − lo_min`
    pub capacity_slack_below: f64,
    /// Relaxation of the upper capacity bound when inactive: `hi_max − hi_i`
    pub capacity_slack_above: f64,
    /// Relaxation of the CAPEX equality when inactive
    pub capex_slack: f64,
}

impl CapexRegime {
    /// Whether `(capacity, capex)` satisfies this regime's law.
    pub fn admits(&self, capacity: f64, capex: f64, tolerance: f64) -> bool {
        let scale = self.segment.capex_at(capacity).abs().max(1.0);
        self.segment.contains(capacity, tolerance)
            && (capex - self.segment.capex_at(capacity)).abs() <= tolerance * scale
    }
}

/// Linearizer for a validated [`CapexCurve`].
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseCapex {
    regimes: Vec<CapexRegime>,
    min_capacity: f64,
    max_capacity: f64,
    min_capex: f64,
    max_capex: f64,
}

/// Model handles for the capacity decision.
#[derive(Debug, Clone)]
pub struct CapexVariables {
    pub capacity: Variable,
    pub capex: Variable,
    /// One binary per regime, in curve order
    pub selected: Vec<Variable>,
}

impl PiecewiseCapex {
    pub fn new(curve: &CapexCurve) -> Self {
        let min_capacity = curve.min_capacity();
        let max_capacity = curve.max_capacity();
        let (min_capex, max_capex) = curve.capex_range();

        let regimes = curve
            .segments()
            .iter()
            .enumerate()
            .map(|(index, seg)| {
                // b_i ≥ 0, so the law is smallest at lo_min and largest at hi_max
                let low_end = seg.capex_at(min_capacity);
                let high_end = seg.capex_at(max_capacity);
                CapexRegime {
                    index,
                    segment: *seg,
                    capacity_slack_below: seg.lower - min_capacity,
                    capacity_slack_above: max_capacity - seg.upper,
                    capex_slack: (max_capex - low_end).max(high_end - min_capex).max(0.0),
                }
            })
            .collect();

        Self {
            regimes,
            min_capacity,
            max_capacity,
            min_capex,
            max_capex,
        }
    }

    pub fn regimes(&self) -> &[CapexRegime] {
        &self.regimes
    }

    pub fn capacity_bounds(&self) -> (f64, f64) {
        (self.min_capacity, self.max_capacity)
    }

    pub fn capex_bounds(&self) -> (f64, f64) {
        (self.min_capex, self.max_capex)
    }

    /// Largest slack constant over all regimes.
    pub fn largest_slack(&self) -> f64 {
        self.regimes
            .iter()
            .map(|r| {
                r.capacity_slack_below
                    .max(r.capacity_slack_above)
                    .max(r.capex_slack)
            })
            .fold(0.0, f64::max)
    }

    /// Declare capacity, CAPEX and one selector binary per regime.
    pub fn declare(&self, vars: &mut ProblemVariables) -> CapexVariables {
        let capacity = vars.add(variable().min(self.min_capacity).max(self.max_capacity));
        let capex = vars.add(variable().min(self.min_capex).max(self.max_capex));
        let selected = vars.add_vector(variable().binary(), self.regimes.len());
        CapexVariables {
            capacity,
            capex,
            selected,
        }
    }

    pub fn constraints(&self, v: &CapexVariables) -> Vec<TaggedConstraint> {
        let mut out = Vec::with_capacity(4 * self.regimes.len() + 1);

        let choice: Expression = v.selected.iter().copied().sum();
        out.push(TaggedConstraint::new(
            ConstraintFamily::SegmentSelection,
            constraint!(choice == 1.0),
        ));

        for (regime, &z) in self.regimes.iter().zip(&v.selected) {
            let seg = &regime.segment;
            let off: Expression = 1.0 - z;

            let below = regime.capacity_slack_below;
            let above = regime.capacity_slack_above;
            out.push(TaggedConstraint::new(
                ConstraintFamily::SegmentCapacity,
                constraint!(v.capacity + below * off.clone() >= seg.lower),
            ));
            out.push(TaggedConstraint::new(
                ConstraintFamily::SegmentCapacity,
                constraint!(v.capacity - above * off.clone() <= seg.upper),
            ));

            // capex − (a_i + b_i·(capacity − lo_i))
            let gap = v.capex - seg.marginal_capex * v.capacity;
            let intercept = seg.base_capex - seg.marginal_capex * seg.lower;
            let slack = regime.capex_slack;
            out.push(TaggedConstraint::new(
                ConstraintFamily::SegmentCapex,
                constraint!(gap.clone() + slack * off.clone() >= intercept),
            ));
            out.push(TaggedConstraint::new(
                ConstraintFamily::SegmentCapex,
                constraint!(gap - slack * off <= intercept),
            ));
        }

        out
    }
}
