//! `ureaplan validate`

use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;
use ureaplan_algo::SitingModel;
use ureaplan_cli::Scenario;

pub fn handle(path: &Path) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let params = scenario.parameter_set()?;
    let problem = scenario.problem(params)?;
    let model = SitingModel::assemble(&problem)?;
    let stats = model.stats();

    let curve = problem.capex_curve()?;
    println!("Scenario is valid");
    println!("  Locations: {}", problem.params.num_locations());
    println!("  Sources:   {}", problem.params.num_sources());
    println!("  Routes:    {}", problem.params.num_routes());
    println!(
        "  Capacity:  {} segment(s), {}..{} t/h{}",
        curve.len(),
        curve.min_capacity(),
        curve.max_capacity(),
        if curve.is_convex() { "" } else { " (non-convex)" }
    );
    println!(
        "  Variables: {} continuous, {} binary",
        stats.continuous_variables, stats.binary_variables
    );
    let (capex_lo, capex_hi) = model.linearizer().capex_bounds();
    println!("  CAPEX:     {capex_lo}..{capex_hi}");
    println!("  Production big-M: {}", stats.production_big_m);
    println!("  Longest route: {} km", problem.params.max_distance());
    println!();

    let params = &problem.params;
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SOURCE\tKIND\tTOTAL SUPPLY")?;
    for source in params.sources() {
        writeln!(
            writer,
            "{}\t{:?}\t{:.2} {}",
            source.name,
            source.kind,
            params.total_supply(source.id),
            source.kind.unit()
        )?;
    }
    writeln!(writer)?;
    writeln!(writer, "CONSTRAINT FAMILY\tROWS")?;
    for (family, count) in &stats.constraints {
        writeln!(writer, "{family}\t{count}")?;
    }
    writeln!(writer, "total\t{}", stats.total_constraints())?;
    writer.flush()?;
    Ok(())
}
