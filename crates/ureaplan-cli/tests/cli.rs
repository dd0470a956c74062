//! Integration tests for the `ureaplan` binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn demo_scenario() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/southern_brazil/scenario.toml")
}

/// Two locations: cheap husk at L1, all demand at L2, free transport.
fn small_scenario(dir: &Path) -> PathBuf {
    fs::write(
        dir.join("locations.csv"),
        "location_id,name,location_type,region,state,urea_demand,urea_price,rice_husk,rice_husk_cost\n\
         L1,Farm,microregion,South,RS,0,1000,100,1\n\
         L2,City,microregion,South,RS,50,1000,0,2\n",
    )
    .unwrap();
    fs::write(dir.join("distances.csv"), ",L1,L2\nL1,0,200\nL2,200,0\n").unwrap();

    let scenario = dir.join("scenario.toml");
    fs::write(
        &scenario,
        r#"
[data]
locations = "locations.csv"
distances = "distances.csv"

[[sources]]
name = "rice_husk"

[[routes]]
name = "Pure oxygen gasification"
conversion = { rice_husk = 0.81 }

[economics]
price_per_trip = 0.0
"#,
    )
    .unwrap();
    scenario
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = cargo_bin_cmd!("ureaplan");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_backends_lists_microlp() {
    let mut cmd = cargo_bin_cmd!("ureaplan");
    cmd.arg("backends")
        .assert()
        .success()
        .stdout(predicate::str::contains("microlp"));
}

#[test]
fn test_validate_demo_scenario() {
    let mut cmd = cargo_bin_cmd!("ureaplan");
    cmd.args(["validate"])
        .arg(demo_scenario())
        .assert()
        .success()
        .stdout(predicate::str::contains("Scenario is valid"))
        .stdout(predicate::str::contains("Locations: 3"))
        .stdout(predicate::str::contains("plant_location_limit"))
        .stdout(predicate::str::contains("Longest route"))
        .stdout(predicate::str::contains("corn_stover"));
}

#[test]
fn test_solve_demo_scenario() {
    let output = cargo_bin_cmd!("ureaplan")
        .args(["--log-level", "error", "solve", "--json"])
        .arg(demo_scenario())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "optimal");
    assert_eq!(value["selected_code"], "4201");
    let npv = value["npv"]["npv"].as_f64().unwrap();
    assert!((npv - 176_294_483.10).abs() < 1.0, "npv {npv}");
}

#[test]
fn test_negative_time_limit_fails() {
    let dir = TempDir::new().unwrap();
    let scenario = small_scenario(dir.path());

    let mut cmd = cargo_bin_cmd!("ureaplan");
    cmd.args(["solve", "--time-limit=-1"])
        .arg(&scenario)
        .assert()
        .failure()
        .stderr(predicate::str::contains("time limit must be a positive number"));
}

#[test]
fn test_solve_small_scenario() {
    let dir = TempDir::new().unwrap();
    let scenario = small_scenario(dir.path());
    let out = dir.path().join("out");

    let mut cmd = cargo_bin_cmd!("ureaplan");
    cmd.arg("solve")
        .arg(&scenario)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected Site: Farm (L1)"));

    assert!(out.join("solution.json").exists());
    assert!(out.join("sites.csv").exists());
    assert!(out.join("route_usage.csv").exists());
    assert!(out.join("flows").join("urea_sold.csv").exists());
}

#[test]
fn test_solve_json_output() {
    let dir = TempDir::new().unwrap();
    let scenario = small_scenario(dir.path());

    let output = cargo_bin_cmd!("ureaplan")
        .args(["--log-level", "error", "solve", "--json"])
        .arg(&scenario)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["selected_code"], "L1");
    assert_eq!(value["backend"], "microlp");
}

#[test]
fn test_unknown_backend_fails() {
    let dir = TempDir::new().unwrap();
    let scenario = small_scenario(dir.path());

    let mut cmd = cargo_bin_cmd!("ureaplan");
    cmd.args(["solve", "--backend", "gurobi"])
        .arg(&scenario)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown milp backend"));
}

#[test]
fn test_missing_column_fails() {
    let dir = TempDir::new().unwrap();
    let scenario = small_scenario(dir.path());
    fs::write(
        dir.path().join("locations.csv"),
        "location_id,name,location_type,region,state,urea_demand,urea_price\nL1,Farm,m,S,RS,0,1\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("ureaplan");
    cmd.arg("validate")
        .arg(&scenario)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing column 'rice_husk'"));
}
