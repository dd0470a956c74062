//! # ureaplan-io: Table Import & Solution Export
//!
//! File-facing side of the siting workflow. The core crates never touch the
//! filesystem; this crate reads the input tables into a
//! [`ureaplan_core::ParameterSetBuilder`] and writes solved plants back out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ureaplan_core::{LocationFilter, ParameterSet, SourceKind};
//! use ureaplan_io::importers::{DistanceTable, LocationTable};
//!
//! fn main() -> anyhow::Result<()> {
//!     let sources = vec!["rice_husk".to_string()];
//!     let table = LocationTable::from_path("locations.csv", &sources)?
//!         .filtered(&LocationFilter::all().with_location_type("microregion"))?;
//!
//!     let mut builder = ParameterSet::builder();
//!     let husk = builder.source("rice_husk", SourceKind::Biomass);
//!     table.apply(&mut builder, &[husk])?;
//!     DistanceTable::from_path("distances.csv")?.apply(&mut builder, 100.0)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`importers`]: location and distance CSV readers
//! - [`export`]: JSON, flow CSV, site report and route usage writers

pub mod export;
pub mod importers;

pub use export::{
    solution_to_json_value, write_flow_csv, write_route_usage, write_site_report,
    write_solution_json, FlowFiles,
};
pub use importers::{DistanceLayout, DistanceTable, LocationRecord, LocationTable};
