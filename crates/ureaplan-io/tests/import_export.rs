//! Import → solve → export round trip

use std::fs;
use tempfile::TempDir;
use ureaplan_algo::{solve_siting, SitingProblemBuilder, SolverConfig};
use ureaplan_core::{LocationFilter, ParameterSet, SourceKind};
use ureaplan_io::{
    write_flow_csv, write_route_usage, write_site_report, write_solution_json, DistanceTable,
    LocationTable,
};

const LOCATIONS: &str = "\
location_id,name,location_type,region,state,urea_demand,urea_price,rice_husk,rice_husk_cost
4301,Campanha,microregion,South,RS,0,400,100,1
4302,Serra,microregion,South,RS,50,400,0,2
43,Rio Grande do Sul,state,South,RS,500,400,0,0
";

const DISTANCES: &str = "\
,4301,4302,43
4301,0,200,50
4302,200,0,50
43,50,50,0
";

fn params(dir: &TempDir) -> ParameterSet {
    let loc_path = dir.path().join("locations.csv");
    let dist_path = dir.path().join("distances.csv");
    fs::write(&loc_path, LOCATIONS).unwrap();
    fs::write(&dist_path, DISTANCES).unwrap();

    let sources = vec!["rice_husk".to_string()];
    let table = LocationTable::from_path(&loc_path, &sources)
        .unwrap()
        .filtered(&LocationFilter::all().with_location_type("microregion"))
        .unwrap();

    let mut builder = ParameterSet::builder();
    let husk = builder.source("rice_husk", SourceKind::Biomass);
    let route = builder.route("Pure oxygen gasification");
    builder.conversion_yield(husk, route, 0.81);
    table.apply(&mut builder, &[husk]).unwrap();

    // 4 of the 9 entries reference the two microregions only
    let applied = DistanceTable::from_path(&dist_path)
        .unwrap()
        .apply(&mut builder, 100.0)
        .unwrap();
    assert_eq!(applied, 4);

    builder.build().unwrap()
}

#[test]
fn test_csv_tables_build_a_parameter_set() {
    let dir = TempDir::new().unwrap();
    let params = params(&dir);

    assert_eq!(params.num_locations(), 2);
    let serra = params.location_by_code("4302").unwrap();
    let campanha = params.location_by_code("4301").unwrap();
    assert_eq!(params.demand(serra), 50.0);
    assert_eq!(params.distance(campanha, serra), 300.0);
    assert_eq!(params.distance(serra, serra), 100.0);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = LocationTable::from_path(dir.path().join("absent.csv"), &[]).unwrap_err();
    assert!(matches!(err, ureaplan_core::UreaError::Io(_)));
}

#[test]
fn test_solution_exports() {
    let dir = TempDir::new().unwrap();
    let params = params(&dir);
    let problem = SitingProblemBuilder::new(params.clone())
        .transport(0.0, 60.0)
        .build();
    let solution = solve_siting(&problem, &SolverConfig::default()).unwrap();
    assert_eq!(solution.selected_code, "4301");

    let json_path = dir.path().join("solution.json");
    write_solution_json(&solution, &json_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["selected_code"], "4301");
    assert_eq!(value["status"], "optimal");

    let files = write_flow_csv(&solution, &dir.path().join("flows")).unwrap();
    let urea = fs::read_to_string(&files.urea_sold).unwrap();
    assert!(urea.starts_with("from,to,amount\n"));
    assert!(urea.contains("4301,4302,"));
    assert!(files.utility_used.is_none());

    let report_path = dir.path().join("sites.csv");
    write_site_report(&params, &solution, &report_path).unwrap();
    let mut reader = csv::Reader::from_path(&report_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(7), Some("plant_installed"));
    assert_eq!(headers.get(8), Some("rice_husk_used"));
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(7), Some("1"));
    assert_eq!(rows[1].get(7), Some("0"));
    let sold: f64 = rows[1].get(9).unwrap().parse().unwrap();
    assert!((sold - 50.0).abs() < 1e-6);

    let usage_path = dir.path().join("route_usage.csv");
    write_route_usage(&params, &solution, &usage_path).unwrap();
    let usage = fs::read_to_string(&usage_path).unwrap();
    assert!(usage.starts_with("route,rice_husk\nPure oxygen gasification,"));
}
