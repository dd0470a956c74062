//! `ureaplan solve`

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{info, warn};
use ureaplan_algo::{solve_siting, MilpBackend, PlantSolution, SitingProblem};
use ureaplan_cli::Scenario;
use ureaplan_io::{
    solution_to_json_value, write_flow_csv, write_route_usage, write_site_report,
    write_solution_json,
};

pub struct SolveArgs<'a> {
    pub scenario: &'a Path,
    pub out: Option<&'a Path>,
    pub backend: Option<&'a str>,
    pub time_limit: Option<f64>,
    pub json: bool,
}

pub fn handle(args: SolveArgs<'_>) -> Result<()> {
    let scenario = Scenario::load(args.scenario)?;
    let params = scenario.parameter_set()?;
    info!(
        locations = params.num_locations(),
        sources = params.num_sources(),
        routes = params.num_routes(),
        "scenario loaded"
    );

    let mut config = scenario.solver.clone();
    if let Some(name) = args.backend {
        config.backend = name.parse::<MilpBackend>()?;
    }
    if let Some(seconds) = args.time_limit {
        config.time_limit_seconds = Some(seconds);
    }

    let problem = scenario.problem(params)?;
    let solution = match solve_siting(&problem, &config) {
        Ok(solution) => solution,
        Err(e) => match e.best_solution() {
            Some(best) => {
                warn!("{e}; reporting best solution found");
                best.clone()
            }
            None => return Err(e).context("solving siting problem"),
        },
    };

    verify(&problem, &solution)?;

    if args.json {
        let value = solution_to_json_value(&solution)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", solution.summary());
    }

    if let Some(dir) = args.out {
        export(&problem.params, &solution, dir)?;
        info!("Results written to {}", dir.display());
    }

    Ok(())
}

/// Fail when the extracted values break the model's own relations.
fn verify(problem: &SitingProblem, solution: &PlantSolution) -> Result<()> {
    if let Err(violations) = solution.check_invariants(problem, 1e-6) {
        bail!(
            "solution from {} failed {} check(s):\n  {}",
            solution.backend,
            violations.len(),
            violations.join("\n  ")
        );
    }
    Ok(())
}

fn export(params: &ureaplan_core::ParameterSet, solution: &PlantSolution, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    write_solution_json(solution, &dir.join("solution.json"))?;
    write_flow_csv(solution, &dir.join("flows"))?;
    write_site_report(params, solution, &dir.join("sites.csv"))?;
    write_route_usage(params, solution, &dir.join("route_usage.csv"))?;
    Ok(())
}
