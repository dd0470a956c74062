//! Distance table importer

use super::{csv_error, parse_cell};
use csv::{ReaderBuilder, Trim};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};
use ureaplan_core::{ParameterSetBuilder, UreaError, UreaResult};

/// Shape of a distance file, detected from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceLayout {
    /// Square matrix with location codes on both axes
    Matrix,
    /// One `origin,destination,distance` row per pair
    Long,
}

impl DistanceLayout {
    fn detect(headers: &csv::StringRecord) -> Self {
        let names: Vec<String> = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
        if names == ["origin", "destination", "distance"] {
            DistanceLayout::Long
        } else {
            DistanceLayout::Matrix
        }
    }
}

/// Pairwise distances keyed by location code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceTable {
    entries: BTreeMap<(String, String), f64>,
}

impl DistanceTable {
    pub fn from_path(path: impl AsRef<Path>) -> UreaResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> UreaResult<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = reader.headers().map_err(csv_error)?.clone();
        let layout = DistanceLayout::detect(&headers);
        let mut entries = BTreeMap::new();

        match layout {
            DistanceLayout::Matrix => {
                let codes: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
                for row in reader.records() {
                    let row = row.map_err(csv_error)?;
                    let line = row.position().map_or(0, |p| p.line());
                    let origin = row.get(0).unwrap_or_default().to_string();
                    for (k, to) in codes.iter().enumerate() {
                        let value = parse_cell(row.get(k + 1).unwrap_or_default(), line, to)?;
                        entries.insert((origin.clone(), to.clone()), value);
                    }
                }
            }
            DistanceLayout::Long => {
                for row in reader.records() {
                    let row = row.map_err(csv_error)?;
                    let line = row.position().map_or(0, |p| p.line());
                    let origin = row.get(0).unwrap_or_default().to_string();
                    let destination = row.get(1).unwrap_or_default().to_string();
                    let value = parse_cell(row.get(2).unwrap_or_default(), line, "distance")?;
                    entries.insert((origin, destination), value);
                }
            }
        }

        debug!(?layout, entries = entries.len(), "read distance table");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, from: &str, to: &str) -> Option<f64> {
        self.entries
            .get(&(from.to_string(), to.to_string()))
            .copied()
    }

    /// Replace each pair given in both directions by the mean of the two.
    /// Road distances are rarely symmetric; the model needs them to be.
    pub fn symmetrized(&self) -> Self {
        let mut entries = self.entries.clone();
        for ((a, b), &forward) in &self.entries {
            if let Some(&backward) = self.entries.get(&(b.clone(), a.clone())) {
                entries.insert((a.clone(), b.clone()), 0.5 * (forward + backward));
            }
        }
        Self { entries }
    }

    /// Set the distance of every pair whose codes are both declared in the
    /// builder, adding `offset` to each entry. Returns the number of entries
    /// applied; pairs naming unknown codes are skipped.
    pub fn apply(&self, builder: &mut ParameterSetBuilder, offset: f64) -> UreaResult<usize> {
        if !offset.is_finite() {
            return Err(UreaError::Config(format!("distance offset must be finite, got {offset}")));
        }

        let mut applied = 0;
        let mut skipped = 0;
        for ((a, b), &value) in &self.entries {
            match (builder.location_by_code(a), builder.location_by_code(b)) {
                (Some(from), Some(to)) => {
                    builder.distance(from, to, value + offset);
                    applied += 1;
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "distance entries for unknown locations ignored");
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ureaplan_core::{LocationInfo, ParameterSet, SourceKind};

    const MATRIX: &str = "\
,A,B,C
A,0,10,20
B,10,0,30
C,20,30,0
";

    #[test]
    fn test_matrix_layout() {
        let table = DistanceTable::from_reader(MATRIX.as_bytes()).unwrap();
        assert_eq!(table.len(), 9);
        assert_eq!(table.get("B", "C"), Some(30.0));
        assert_eq!(table.get("C", "A"), Some(20.0));
    }

    #[test]
    fn test_long_layout() {
        let long = "origin,destination,distance\nA,B,12\nB,A,14\n";
        let table = DistanceTable::from_reader(long.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A", "B"), Some(12.0));

        let sym = table.symmetrized();
        assert_eq!(sym.get("A", "B"), Some(13.0));
        assert_eq!(sym.get("B", "A"), Some(13.0));
    }

    #[test]
    fn test_bad_entry_names_column() {
        let bad = MATRIX.replace("B,10,0,30", "B,10,0,far");
        let err = DistanceTable::from_reader(bad.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 3"), "{msg}");
        assert!(msg.contains("'C'"), "{msg}");
    }

    #[test]
    fn test_apply_offsets_and_skips_unknown() {
        let table = DistanceTable::from_reader(MATRIX.as_bytes()).unwrap();

        let mut b = ParameterSet::builder();
        let a = b.location(LocationInfo::new("A", "A"));
        let c = b.location(LocationInfo::new("C", "C"));
        let s = b.source("husk", SourceKind::Biomass);
        let r = b.route("gasification");
        for l in [a, c] {
            b.supply(s, l, 1.0).price(s, l, 1.0).demand(l, 1.0).urea_price(l, 1.0);
        }
        b.conversion_yield(s, r, 0.81);

        // A-A, A-C, C-A, C-C; everything touching B is dropped
        assert_eq!(table.apply(&mut b, 100.0).unwrap(), 4);

        let params = b.build().unwrap();
        assert_eq!(params.distance(a, c), 120.0);
        assert_eq!(params.distance(c, c), 100.0);
    }
}
