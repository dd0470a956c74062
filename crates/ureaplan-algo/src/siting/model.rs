//! Assembled siting model
//!
//! [`SitingModel::assemble`] turns a [`SitingProblem`] into variables,
//! tagged constraints and NPV terms. The result is never mutated; the solver
//! consumes it whole.

use super::capex::{CapexVariables, PiecewiseCapex};
use super::error::SitingError;
use super::network::FlowVariables;
use super::objective::{NpvTerms, SitingVariables};
use super::problem::SitingProblem;
use good_lp::{variables, Constraint, ProblemVariables};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ureaplan_core::ModelConsistencyError;

/// Constraint groups of the formulation, used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    ConversionRatio,
    UtilityRatio,
    SourceBalance,
    SupplyLimit,
    UreaBalance,
    DemandLimit,
    CapacityLink,
    PlantLocationLimit,
    PlantProductionLimit,
    SegmentSelection,
    SegmentCapacity,
    SegmentCapex,
}

impl ConstraintFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintFamily::ConversionRatio => "conversion_ratio",
            ConstraintFamily::UtilityRatio => "utility_ratio",
            ConstraintFamily::SourceBalance => "source_balance",
            ConstraintFamily::SupplyLimit => "supply_limit",
            ConstraintFamily::UreaBalance => "urea_balance",
            ConstraintFamily::DemandLimit => "demand_limit",
            ConstraintFamily::CapacityLink => "capacity_link",
            ConstraintFamily::PlantLocationLimit => "plant_location_limit",
            ConstraintFamily::PlantProductionLimit => "plant_production_limit",
            ConstraintFamily::SegmentSelection => "segment_selection",
            ConstraintFamily::SegmentCapacity => "segment_capacity",
            ConstraintFamily::SegmentCapex => "segment_capex",
        }
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A linear constraint together with the family it belongs to.
pub struct TaggedConstraint {
    pub family: ConstraintFamily,
    pub constraint: Constraint,
}

impl TaggedConstraint {
    pub fn new(family: ConstraintFamily, constraint: Constraint) -> Self {
        Self { family, constraint }
    }
}

/// Size of the assembled model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub continuous_variables: usize,
    pub binary_variables: usize,
    /// Constraint count per family name
    pub constraints: BTreeMap<String, usize>,
    /// Production big-M used by the siting link
    pub production_big_m: f64,
    /// Largest CAPEX regime slack
    pub capex_slack: f64,
}

impl ModelStats {
    pub fn total_variables(&self) -> usize {
        self.continuous_variables + self.binary_variables
    }

    pub fn total_constraints(&self) -> usize {
        self.constraints.values().sum()
    }

    pub fn constraint_count(&self, family: ConstraintFamily) -> usize {
        self.constraints.get(family.as_str()).copied().unwrap_or(0)
    }
}

/// Immutable MILP for one siting run.
pub struct SitingModel {
    pub(crate) vars: ProblemVariables,
    pub(crate) constraints: Vec<TaggedConstraint>,
    pub(crate) flows: FlowVariables,
    pub(crate) siting: SitingVariables,
    pub(crate) capex: CapexVariables,
    pub(crate) linearizer: PiecewiseCapex,
    pub(crate) npv: NpvTerms,
    pub(crate) stats: ModelStats,
}

impl SitingModel {
    /// Declare every variable and constraint of the siting formulation.
    pub fn assemble(problem: &SitingProblem) -> Result<Self, SitingError> {
        problem.economics.validate()?;
        let curve = problem.capex_curve()?;
        let params = &problem.params;

        let big_m = production_big_m(problem)?;
        let linearizer = PiecewiseCapex::new(&curve);

        let mut vars = variables!();
        let capex = linearizer.declare(&mut vars);
        let flows = FlowVariables::declare(&mut vars, params);
        let siting = SitingVariables::declare(&mut vars, params.num_locations());

        let mut constraints = flows.constraints(params);
        constraints.extend(linearizer.constraints(&capex));
        constraints.extend(siting.constraints(&flows, big_m));
        constraints.push(siting.capacity_link(&flows, &capex, problem.economics.yearly_hours));

        let npv = NpvTerms::build(problem, &flows, &capex);

        let mut by_family: BTreeMap<String, usize> = BTreeMap::new();
        for c in &constraints {
            *by_family.entry(c.family.as_str().to_string()).or_insert(0) += 1;
        }
        let binary_variables = capex.selected.len() + siting.plant_installed.len();
        let stats = ModelStats {
            continuous_variables: flows.len() + 2,
            binary_variables,
            constraints: by_family,
            production_big_m: big_m,
            capex_slack: linearizer.largest_slack(),
        };

        tracing::debug!(
            variables = stats.total_variables(),
            binaries = stats.binary_variables,
            constraints = stats.total_constraints(),
            big_m = stats.production_big_m,
            capex_slack = stats.capex_slack,
            "assembled siting model"
        );

        Ok(Self {
            vars,
            constraints,
            flows,
            siting,
            capex,
            linearizer,
            npv,
            stats,
        })
    }

    pub fn stats(&self) -> &ModelStats {
        &self.stats
    }

    pub fn linearizer(&self) -> &PiecewiseCapex {
        &self.linearizer
    }
}

/// Big-M for `Σ_r produced[r, l] ≤ M · plant_installed[l]`.
///
/// Production is capped by the largest installable capacity times the
/// operating hours and by total demand, so the smaller of the two is the
/// tightest constant that never binds at the installed location.
fn production_big_m(problem: &SitingProblem) -> Result<f64, ModelConsistencyError> {
    let required = problem.max_yearly_production()?;
    match problem.big_m {
        None => Ok(required),
        Some(given) if given.is_finite() && given >= required => Ok(given),
        Some(given) => Err(ModelConsistencyError::BigMTooSmall {
            name: "production",
            given,
            required,
        }),
    }
}
