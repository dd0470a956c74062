//! Per-location site report and route usage table

use anyhow::{Context, Result};
use csv::Writer;
use std::collections::HashMap;
use std::path::Path;
use ureaplan_algo::PlantSolution;
use ureaplan_core::{LocationId, ParameterSet, RouteId, SourceId};

/// Location table extended with the plant decision.
///
/// Columns: the location attributes, `urea_demand`, `urea_price`,
/// `plant_installed` (0/1), one `<source>_used` column with the amount each
/// location ships into the plant, and `urea_sold` with the amount the plant
/// delivers to it.
pub fn write_site_report(params: &ParameterSet, solution: &PlantSolution, path: &Path) -> Result<()> {
    let plant = solution.selected_location;

    let mut into_plant: HashMap<(SourceId, LocationId), f64> = HashMap::new();
    for row in solution.source_sold.iter().filter(|r| r.to == plant) {
        *into_plant.entry((row.source, row.from)).or_insert(0.0) += row.amount;
    }
    let delivered: HashMap<LocationId, f64> = solution
        .urea_sold
        .iter()
        .filter(|r| r.from == plant)
        .map(|r| (r.to, r.amount))
        .collect();

    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("creating CSV writer for {}", path.display()))?;

    let mut header: Vec<String> = [
        "location_id",
        "name",
        "location_type",
        "region",
        "state",
        "urea_demand",
        "urea_price",
        "plant_installed",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(params.sources().iter().map(|s| format!("{}_used", s.name)));
    header.push("urea_sold".to_string());
    wtr.write_record(&header).context("writing CSV header")?;

    for loc in params.locations() {
        let mut record = vec![
            loc.info.code.clone(),
            loc.info.name.clone(),
            loc.info.location_type.clone(),
            loc.info.region.clone(),
            loc.info.state.clone(),
            params.demand(loc.id).to_string(),
            params.urea_price(loc.id).to_string(),
            u8::from(loc.id == plant).to_string(),
        ];
        for source in params.source_ids() {
            let amount = into_plant.get(&(source, loc.id)).copied().unwrap_or(0.0);
            record.push(amount.to_string());
        }
        record.push(delivered.get(&loc.id).copied().unwrap_or(0.0).to_string());
        wtr.write_record(&record).context("writing CSV record")?;
    }

    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

/// Feedstock consumed at the plant, one row per route and one column per source.
pub fn write_route_usage(params: &ParameterSet, solution: &PlantSolution, path: &Path) -> Result<()> {
    let used: HashMap<(RouteId, SourceId), f64> = solution
        .source_used
        .iter()
        .filter(|r| r.location == solution.selected_location)
        .map(|r| ((r.route, r.source), r.amount))
        .collect();

    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("creating CSV writer for {}", path.display()))?;

    let mut header = vec!["route".to_string()];
    header.extend(params.sources().iter().map(|s| s.name.clone()));
    wtr.write_record(&header).context("writing CSV header")?;

    for route in params.routes() {
        let mut record = vec![route.name.clone()];
        for source in params.source_ids() {
            let amount = used.get(&(route.id, source)).copied().unwrap_or(0.0);
            record.push(amount.to_string());
        }
        wtr.write_record(&record).context("writing CSV record")?;
    }

    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}
