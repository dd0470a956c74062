//! Solution exporters
//!
//! - [`write_solution_json`]: the full [`PlantSolution`](ureaplan_algo::PlantSolution)
//! - [`write_flow_csv`]: one CSV per flow table
//! - [`write_site_report`]: the location table extended with the plant decision
//!   and the flows in and out of the plant
//! - [`write_route_usage`]: feedstock consumed at the plant, routes × sources

mod report;
mod solution;

pub use report::{write_route_usage, write_site_report};
pub use solution::{solution_to_json_value, write_flow_csv, write_solution_json, FlowFiles};
