//! Location table importer

use super::{csv_error, parse_cell};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use ureaplan_core::{
    LocationFilter, LocationId, LocationInfo, ParameterSetBuilder, SourceId, UreaError,
    UreaResult, ValidationError,
};

const CODE: &str = "location_id";
const NAME: &str = "name";
const LOCATION_TYPE: &str = "location_type";
const REGION: &str = "region";
const STATE: &str = "state";
const DEMAND: &str = "urea_demand";
const PRICE: &str = "urea_price";

/// One row of the location table.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub info: LocationInfo,
    pub urea_demand: f64,
    pub urea_price: f64,
    /// Available supply, one entry per source of the table
    pub supply: Vec<f64>,
    /// Unit price, one entry per source of the table
    pub cost: Vec<f64>,
}

/// Parsed location table.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationTable {
    sources: Vec<String>,
    records: Vec<LocationRecord>,
}

/// Column positions resolved from the header row.
struct Columns {
    code: usize,
    name: usize,
    location_type: usize,
    region: usize,
    state: usize,
    demand: usize,
    price: usize,
    supply: Vec<usize>,
    cost: Vec<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, sources: &[String]) -> UreaResult<Self> {
        let find = |name: &str| -> UreaResult<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| UreaError::Parse(format!("location table: missing column '{name}'")))
        };

        let mut supply = Vec::with_capacity(sources.len());
        let mut cost = Vec::with_capacity(sources.len());
        for source in sources {
            supply.push(find(source)?);
            cost.push(find(&format!("{source}_cost"))?);
        }

        Ok(Self {
            code: find(CODE)?,
            name: find(NAME)?,
            location_type: find(LOCATION_TYPE)?,
            region: find(REGION)?,
            state: find(STATE)?,
            demand: find(DEMAND)?,
            price: find(PRICE)?,
            supply,
            cost,
        })
    }
}

impl LocationTable {
    /// Read the table, keeping the supply and cost columns of `sources`.
    pub fn from_path(path: impl AsRef<Path>, sources: &[String]) -> UreaResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file, sources)
    }

    pub fn from_reader<R: Read>(reader: R, sources: &[String]) -> UreaResult<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = reader.headers().map_err(csv_error)?.clone();
        let columns = Columns::resolve(&headers, sources)?;
        let header_of = |i: usize| headers.get(i).unwrap_or_default();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(csv_error)?;
            let line = row.position().map_or(0, |p| p.line());
            let text = |i: usize| row.get(i).unwrap_or_default().to_string();
            let number = |i: usize| parse_cell(row.get(i).unwrap_or_default(), line, header_of(i));

            let code = text(columns.code);
            if code.is_empty() {
                return Err(UreaError::Parse(format!(
                    "line {line}, column '{CODE}': empty location code"
                )));
            }

            records.push(LocationRecord {
                info: LocationInfo::new(code, text(columns.name))
                    .with_type(text(columns.location_type))
                    .with_region(text(columns.region), text(columns.state)),
                urea_demand: number(columns.demand)?,
                urea_price: number(columns.price)?,
                supply: columns
                    .supply
                    .iter()
                    .map(|&i| number(i))
                    .collect::<UreaResult<_>>()?,
                cost: columns
                    .cost
                    .iter()
                    .map(|&i| number(i))
                    .collect::<UreaResult<_>>()?,
            });
        }

        debug!(rows = records.len(), sources = sources.len(), "read location table");
        Ok(Self {
            sources: sources.to_vec(),
            records,
        })
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep the rows matching `filter`, in table order.
    pub fn filtered(&self, filter: &LocationFilter) -> Result<Self, ValidationError> {
        let records: Vec<_> = self
            .records
            .iter()
            .filter(|r| filter.matches(&r.info))
            .cloned()
            .collect();
        if records.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        Ok(Self {
            sources: self.sources.clone(),
            records,
        })
    }

    /// Declare every row as a location and set its demand, urea price,
    /// supply and cost entries. `source_ids[k]` is the builder's id for the
    /// table's k-th source.
    pub fn apply(
        &self,
        builder: &mut ParameterSetBuilder,
        source_ids: &[SourceId],
    ) -> UreaResult<Vec<LocationId>> {
        if source_ids.len() != self.sources.len() {
            return Err(UreaError::Config(format!(
                "location table carries {} sources but {} were declared",
                self.sources.len(),
                source_ids.len()
            )));
        }

        let mut ids = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let id = builder.location(record.info.clone());
            builder
                .demand(id, record.urea_demand)
                .urea_price(id, record.urea_price);
            for (k, &source) in source_ids.iter().enumerate() {
                builder
                    .supply(source, id, record.supply[k])
                    .price(source, id, record.cost[k]);
            }
            ids.push(id);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
location_id,name,location_type,region,state,urea_demand,urea_price,rice_husk,rice_husk_cost,extra
5001,Farm,microregion,South,RS,0,420,1200,12.5,x
5002,City,microregion,South,SC,300,450,0,14,y
5003,Capital,state,South,RS,900,430,10,13,z
";

    fn sources() -> Vec<String> {
        vec!["rice_husk".to_string()]
    }

    #[test]
    fn test_reads_rows_and_ignores_extra_columns() {
        let table = LocationTable::from_reader(TABLE.as_bytes(), &sources()).unwrap();
        assert_eq!(table.len(), 3);

        let farm = &table.records()[0];
        assert_eq!(farm.info.code, "5001");
        assert_eq!(farm.info.location_type, "microregion");
        assert_eq!(farm.info.state, "RS");
        assert_eq!(farm.urea_price, 420.0);
        assert_eq!(farm.supply, vec![1200.0]);
        assert_eq!(farm.cost, vec![12.5]);
    }

    #[test]
    fn test_missing_column_is_named() {
        let err = LocationTable::from_reader(TABLE.as_bytes(), &["corn_stover".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("missing column 'corn_stover'"), "{err}");
    }

    #[test]
    fn test_bad_cell_names_line_and_column() {
        let bad = TABLE.replace("300,450", "300,n/a");
        let err = LocationTable::from_reader(bad.as_bytes(), &sources()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 3"), "{msg}");
        assert!(msg.contains("urea_price"), "{msg}");
    }

    #[test]
    fn test_filter_keeps_order() {
        let table = LocationTable::from_reader(TABLE.as_bytes(), &sources()).unwrap();
        let micro = table
            .filtered(&LocationFilter::all().with_location_type("microregion"))
            .unwrap();
        let codes: Vec<_> = micro.records().iter().map(|r| r.info.code.as_str()).collect();
        assert_eq!(codes, ["5001", "5002"]);

        let none = table.filtered(&LocationFilter::all().with_state("SP"));
        assert!(matches!(none, Err(ValidationError::EmptySelection)));
    }
}
