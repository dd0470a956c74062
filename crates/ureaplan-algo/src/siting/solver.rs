//! Siting MILP solver
//!
//! Hands the assembled model to a good_lp backend and maps the outcome back
//! onto the problem's locations, sources and routes.

use super::capex::CapexVariables;
use super::error::SitingError;
use super::model::{SitingModel, TaggedConstraint};
use super::network::FlowVariables;
use super::objective::{NpvTerms, SitingVariables};
use super::problem::SitingProblem;
use super::solution::{
    NpvBreakdown, PlantSolution, RouteOutput, SiteDecision, SolveStatus, SourceConsumption,
    SourceShipment, UreaShipment, FLOW_EPSILON,
};
use good_lp::solvers::microlp::microlp;
use good_lp::solvers::SolutionStatus;
use good_lp::{ResolutionError, Solution, SolverModel, Variable};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use ureaplan_core::LocationId;

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs;

/// MILP backend used for the solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilpBackend {
    /// Pure-Rust branch-and-bound
    #[default]
    Microlp,
    #[cfg(feature = "solver-highs")]
    Highs,
}

const AVAILABLE_BACKENDS: &[&str] = &[
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

impl MilpBackend {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_BACKENDS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MilpBackend::Microlp => "microlp",
            #[cfg(feature = "solver-highs")]
            MilpBackend::Highs => "highs",
        }
    }

    /// Whether the backend enforces a wall-clock limit and a MIP gap.
    pub fn supports_limits(&self) -> bool {
        match self {
            MilpBackend::Microlp => false,
            #[cfg(feature = "solver-highs")]
            MilpBackend::Highs => true,
        }
    }
}

impl FromStr for MilpBackend {
    type Err = SitingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "microlp" => Ok(MilpBackend::Microlp),
            #[cfg(feature = "solver-highs")]
            "highs" => Ok(MilpBackend::Highs),
            other => Err(SitingError::Solver(format!(
                "unknown milp backend '{}'; supported values: {}",
                other,
                MilpBackend::available().join(", ")
            ))),
        }
    }
}

/// Siting solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: MilpBackend,
    /// Wall-clock limit (seconds)
    pub time_limit_seconds: Option<f64>,
    /// Relative MIP optimality gap
    pub mip_gap: Option<f64>,
    /// Whether to enable verbose solver output
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: MilpBackend::default(),
            time_limit_seconds: None,
            mip_gap: None,
            verbose: false,
        }
    }
}

impl SolverConfig {
    pub fn with_backend(mut self, backend: MilpBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_seconds = Some(seconds);
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = Some(gap);
        self
    }

    /// Reject limits no backend can apply.
    pub fn validate(&self) -> Result<(), SitingError> {
        if let Some(seconds) = self.time_limit_seconds {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(SitingError::Solver(format!(
                    "time limit must be a positive number of seconds, got {seconds}"
                )));
            }
        }
        if let Some(gap) = self.mip_gap {
            if !gap.is_finite() || gap < 0.0 {
                return Err(SitingError::Solver(format!(
                    "MIP gap must be a non-negative number, got {gap}"
                )));
            }
        }
        Ok(())
    }
}

/// Map the backend's termination reason onto the reported status.
fn classify(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::TimeLimit => SolveStatus::TimeLimitReached,
        SolutionStatus::GapLimit => SolveStatus::GapLimitReached,
        _ => SolveStatus::Optimal,
    }
}

/// Handles needed to read a solution back.
struct Handles {
    flows: FlowVariables,
    siting: SitingVariables,
    capex: CapexVariables,
    npv: NpvTerms,
}

/// Solve the siting problem
///
/// # Example
///
/// ```no_run
/// use ureaplan_algo::siting::{solve_siting, SitingProblemBuilder, SolverConfig};
/// use ureaplan_core::ParameterSet;
///
/// # fn load() -> ParameterSet { unimplemented!() }
/// let params: ParameterSet = load();
/// let problem = SitingProblemBuilder::new(params).build();
/// let solution = solve_siting(&problem, &SolverConfig::default())?;
/// println!("{}", solution.summary());
/// # Ok::<(), ureaplan_algo::siting::SitingError>(())
/// ```
pub fn solve_siting(
    problem: &SitingProblem,
    config: &SolverConfig,
) -> Result<PlantSolution, SitingError> {
    config.validate()?;
    let start = Instant::now();
    let model = SitingModel::assemble(problem)?;
    let stats = model.stats.clone();

    info!(
        locations = problem.params.num_locations(),
        sources = problem.params.num_sources(),
        routes = problem.params.num_routes(),
        backend = config.backend.as_str(),
        "solving siting model"
    );

    let SitingModel {
        vars,
        constraints,
        flows,
        siting,
        capex,
        npv,
        ..
    } = model;
    let objective = npv.npv();
    let handles = Handles {
        flows,
        siting,
        capex,
        npv,
    };

    let backend = config.backend;
    let (mut solution, solver_status) = match backend {
        MilpBackend::Microlp => {
            if config.time_limit_seconds.is_some() {
                warn!(backend = backend.as_str(), "time limit is not supported, ignoring");
            }
            if config.mip_gap.is_some() {
                warn!(backend = backend.as_str(), "MIP gap is not supported, ignoring");
            }
            if config.verbose {
                debug!(backend = backend.as_str(), "backend has no verbose output");
            }
            let lp = vars.maximise(objective).using(microlp);
            run(lp, constraints, problem, &handles, backend)?
        }
        #[cfg(feature = "solver-highs")]
        MilpBackend::Highs => {
            let mut lp = vars.maximise(objective).using(highs);
            lp.set_verbose(config.verbose);
            if let Some(seconds) = config.time_limit_seconds {
                lp = lp.set_time_limit(seconds);
            }
            if let Some(gap) = config.mip_gap {
                lp = lp
                    .set_mip_rel_gap(gap as f32)
                    .map_err(|e| SitingError::Solver(format!("invalid MIP gap {gap}: {:?}", e)))?;
            }
            run(lp, constraints, problem, &handles, backend)?
        }
    };

    solution.solve_time = start.elapsed();
    solution.stats = stats;

    let solution = conclude(solution, solver_status, config)?;
    info!(
        site = %solution.selected_code,
        capacity = solution.capacity,
        npv = solution.npv.npv,
        elapsed = ?solution.solve_time,
        "siting solved"
    );
    Ok(solution)
}

/// Label the extracted solution with the backend's termination reason.
///
/// A time-limit stop is surfaced as `SitingError::TimeLimit` carrying the
/// incumbent; a gap-limit stop is returned but not marked proven optimal.
fn conclude(
    mut solution: PlantSolution,
    solver_status: SolutionStatus,
    config: &SolverConfig,
) -> Result<PlantSolution, SitingError> {
    solution.status = classify(solver_status);
    solution.proven_optimal = solution.status == SolveStatus::Optimal;

    if solution.status == SolveStatus::TimeLimitReached {
        let limit_seconds = config.time_limit_seconds.unwrap_or_default();
        warn!(
            limit_seconds,
            npv = solution.npv.npv,
            "time limit reached, returning best solution found"
        );
        return Err(SitingError::TimeLimit {
            limit_seconds,
            best: Box::new(solution),
        });
    }
    if solution.status == SolveStatus::GapLimitReached {
        warn!(
            mip_gap = config.mip_gap.unwrap_or_default(),
            "stopped at the MIP gap, optimality not proven"
        );
    }

    Ok(solution)
}

fn run<P>(
    mut lp: P,
    constraints: Vec<TaggedConstraint>,
    problem: &SitingProblem,
    handles: &Handles,
    backend: MilpBackend,
) -> Result<(PlantSolution, SolutionStatus), SitingError>
where
    P: SolverModel<Error = ResolutionError>,
{
    for tagged in constraints {
        lp = lp.with(tagged.constraint);
    }

    let solved = lp.solve().map_err(|e| match e {
        ResolutionError::Infeasible => SitingError::Infeasible {
            backend: backend.as_str(),
        },
        ResolutionError::Unbounded => SitingError::Unbounded {
            backend: backend.as_str(),
        },
        other => SitingError::Solver(format!("{}: {}", backend.as_str(), other)),
    })?;

    let status = solved.status();
    Ok((extract(&solved, problem, handles, backend), status))
}

/// Index of the largest value; binaries come back as floats near 0 or 1.
fn argmax<S: Solution>(solution: &S, vars: &[Variable]) -> usize {
    vars.iter()
        .map(|&v| solution.value(v))
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, x)| if x > best.1 { (i, x) } else { best })
        .0
}

fn extract<S: Solution>(
    solution: &S,
    problem: &SitingProblem,
    handles: &Handles,
    backend: MilpBackend,
) -> PlantSolution {
    let params = &problem.params;
    let flows = &handles.flows;
    let kept = |x: f64| x > FLOW_EPSILON;

    let selected = LocationId::new(argmax(solution, &handles.siting.plant_installed));
    let segment = argmax(solution, &handles.capex.selected);

    let sites = params
        .locations()
        .iter()
        .map(|loc| SiteDecision {
            location: loc.id,
            code: loc.code().to_string(),
            installed: loc.id == selected,
            production: solution.eval(&flows.production_at(loc.id)).max(0.0),
        })
        .collect();

    let mut source_sold = Vec::new();
    let mut source_used = Vec::new();
    for source in params.sources() {
        for from in params.locations() {
            for to in params.locations() {
                let amount = solution.value(flows.sold(source.id, from.id, to.id));
                if kept(amount) {
                    source_sold.push(SourceShipment {
                        source: source.id,
                        source_name: source.name.clone(),
                        from: from.id,
                        from_code: from.code().to_string(),
                        to: to.id,
                        to_code: to.code().to_string(),
                        amount,
                    });
                }
            }
        }
        for route in params.routes() {
            for loc in params.locations() {
                let amount = solution.value(flows.used(source.id, route.id, loc.id));
                if kept(amount) {
                    source_used.push(SourceConsumption {
                        source: source.id,
                        source_name: source.name.clone(),
                        route: route.id,
                        route_name: route.name.clone(),
                        location: loc.id,
                        location_code: loc.code().to_string(),
                        amount,
                    });
                }
            }
        }
    }

    let mut urea_produced = Vec::new();
    let mut utility_used = Vec::new();
    for route in params.routes() {
        for loc in params.locations() {
            let output = |amount: f64| RouteOutput {
                route: route.id,
                route_name: route.name.clone(),
                location: loc.id,
                location_code: loc.code().to_string(),
                amount,
            };
            let made = solution.value(flows.produced(route.id, loc.id));
            if kept(made) {
                urea_produced.push(output(made));
            }
            if let Some(var) = flows.utility_used(route.id, loc.id) {
                let amount = solution.value(var);
                if kept(amount) {
                    utility_used.push(output(amount));
                }
            }
        }
    }

    let mut urea_sold = Vec::new();
    for from in params.locations() {
        for to in params.locations() {
            let amount = solution.value(flows.urea_sold(from.id, to.id));
            if kept(amount) {
                urea_sold.push(UreaShipment {
                    from: from.id,
                    from_code: from.code().to_string(),
                    to: to.id,
                    to_code: to.code().to_string(),
                    amount,
                });
            }
        }
    }

    let terms = &handles.npv;
    let cash_flow = solution.eval(&terms.cash_flow());
    let npv = NpvBreakdown {
        revenue: solution.eval(&terms.revenue),
        feedstock_cost: solution.eval(&terms.feedstock_cost),
        feedstock_transport_cost: solution.eval(&terms.feedstock_transport_cost),
        product_transport_cost: solution.eval(&terms.product_transport_cost),
        cash_flow,
        discounted_cash_flow: terms.annuity_factor * cash_flow,
        capex: solution.eval(&terms.capex),
        npv: solution.eval(&terms.npv()),
    };

    let location = params.location(selected);
    PlantSolution {
        status: SolveStatus::Optimal,
        proven_optimal: true,
        backend: backend.as_str().to_string(),
        selected_location: selected,
        selected_code: location.code().to_string(),
        selected_name: location.name().to_string(),
        sites,
        capacity: solution.value(handles.capex.capacity),
        capex: solution.value(handles.capex.capex),
        segment,
        npv,
        source_sold,
        source_used,
        urea_produced,
        urea_sold,
        utility_used,
        solve_time: Duration::ZERO,
        stats: Default::default(),
    }
}
