//! CSV importers for the location and distance tables.
//!
//! Both importers produce an intermediate table keyed by location code; the
//! table is then applied to a [`ureaplan_core::ParameterSetBuilder`] so the
//! builder's validation runs over the imported values.
//!
//! ## Location table
//!
//! ```csv
//! location_id,name,location_type,region,state,urea_demand,urea_price,rice_husk,rice_husk_cost
//! 5001,Farm,microregion,South,RS,0,420,1200,12.5
//! ```
//!
//! ## Distance table
//!
//! Either a square matrix (first header cell ignored, codes across the
//! header and down the first column) or long rows `origin,destination,distance`.

mod distances;
mod locations;

pub use distances::{DistanceLayout, DistanceTable};
pub use locations::{LocationRecord, LocationTable};

use ureaplan_core::UreaError;

/// Parse one numeric cell, naming its row and column on failure.
pub(crate) fn parse_cell(cell: &str, line: u64, column: &str) -> Result<f64, UreaError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Err(UreaError::Parse(format!(
            "line {line}, column '{column}': empty cell"
        )));
    }
    cell.parse::<f64>().map_err(|_| {
        UreaError::Parse(format!(
            "line {line}, column '{column}': cannot parse '{cell}' as a number"
        ))
    })
}

pub(crate) fn csv_error(err: csv::Error) -> UreaError {
    UreaError::Parse(err.to_string())
}
