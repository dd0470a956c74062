//! JSON and flow-table export of a plant solution

use anyhow::{Context, Result};
use csv::Writer;
use std::path::{Path, PathBuf};
use ureaplan_algo::PlantSolution;

/// Files written by [`write_flow_csv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowFiles {
    pub source_sold: PathBuf,
    pub source_used: PathBuf,
    pub urea_produced: PathBuf,
    pub urea_sold: PathBuf,
    /// Only written when the model carried a utility table
    pub utility_used: Option<PathBuf>,
}

/// Write the solution as pretty-printed JSON.
pub fn write_solution_json(solution: &PlantSolution, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(solution).context("serializing PlantSolution to JSON")?;
    std::fs::write(path, json).with_context(|| format!("writing JSON to {}", path.display()))?;
    Ok(())
}

/// Convert to a JSON value (for stdout)
pub fn solution_to_json_value(solution: &PlantSolution) -> Result<serde_json::Value> {
    serde_json::to_value(solution).context("converting PlantSolution to JSON value")
}

fn writer(path: &Path) -> Result<Writer<std::fs::File>> {
    Writer::from_path(path).with_context(|| format!("creating CSV writer for {}", path.display()))
}

/// Write the flow tables of the solution into `dir`, one file per table.
/// Only entries above the extraction threshold are present.
pub fn write_flow_csv(solution: &PlantSolution, dir: &Path) -> Result<FlowFiles> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let source_sold = dir.join("source_sold.csv");
    let mut wtr = writer(&source_sold)?;
    wtr.write_record(["source", "from", "to", "amount"])
        .context("writing CSV header")?;
    for row in &solution.source_sold {
        wtr.write_record([
            &row.source_name,
            &row.from_code,
            &row.to_code,
            &row.amount.to_string(),
        ])
        .context("writing CSV record")?;
    }
    wtr.flush().context("flushing CSV writer")?;

    let source_used = dir.join("source_used.csv");
    let mut wtr = writer(&source_used)?;
    wtr.write_record(["source", "route", "location", "amount"])
        .context("writing CSV header")?;
    for row in &solution.source_used {
        wtr.write_record([
            &row.source_name,
            &row.route_name,
            &row.location_code,
            &row.amount.to_string(),
        ])
        .context("writing CSV record")?;
    }
    wtr.flush().context("flushing CSV writer")?;

    let urea_produced = dir.join("urea_produced.csv");
    write_route_output(&urea_produced, &solution.urea_produced)?;

    let urea_sold = dir.join("urea_sold.csv");
    let mut wtr = writer(&urea_sold)?;
    wtr.write_record(["from", "to", "amount"])
        .context("writing CSV header")?;
    for row in &solution.urea_sold {
        wtr.write_record([&row.from_code, &row.to_code, &row.amount.to_string()])
            .context("writing CSV record")?;
    }
    wtr.flush().context("flushing CSV writer")?;

    let utility_used = if solution.utility_used.is_empty() {
        None
    } else {
        let path = dir.join("utility_used.csv");
        write_route_output(&path, &solution.utility_used)?;
        Some(path)
    };

    Ok(FlowFiles {
        source_sold,
        source_used,
        urea_produced,
        urea_sold,
        utility_used,
    })
}

fn write_route_output(path: &Path, rows: &[ureaplan_algo::RouteOutput]) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["route", "location", "amount"])
        .context("writing CSV header")?;
    for row in rows {
        wtr.write_record([&row.route_name, &row.location_code, &row.amount.to_string()])
            .context("writing CSV record")?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}
