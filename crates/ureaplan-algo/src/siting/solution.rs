//! Siting solution data structures
//!
//! Defines the read-only result of a siting run.

use super::model::ModelStats;
use super::problem::SitingProblem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;
use ureaplan_core::{LocationId, RouteId, SourceId};

/// Flow values at or below this magnitude are not reported.
pub const FLOW_EPSILON: f64 = 1e-7;

/// Outcome of a successful solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    #[default]
    Optimal,
    /// Best assignment found when the wall-clock limit was hit
    TimeLimitReached,
    /// Solver stopped within the requested relative MIP gap
    GapLimitReached,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => f.write_str("Optimal"),
            SolveStatus::TimeLimitReached => f.write_str("Time limit reached (not proven optimal)"),
            SolveStatus::GapLimitReached => f.write_str("MIP gap reached (not proven optimal)"),
        }
    }
}

/// Siting decision for one candidate location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDecision {
    pub location: LocationId,
    pub code: String,
    pub installed: bool,
    /// Yearly urea production at this location (all routes)
    pub production: f64,
}

/// Terms of the objective evaluated at the solution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpvBreakdown {
    pub revenue: f64,
    pub feedstock_cost: f64,
    pub feedstock_transport_cost: f64,
    pub product_transport_cost: f64,
    /// Yearly cash flow
    pub cash_flow: f64,
    /// Cash flow discounted over the horizon
    pub discounted_cash_flow: f64,
    pub capex: f64,
    pub npv: f64,
}

/// Source shipped between two locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceShipment {
    pub source: SourceId,
    pub source_name: String,
    pub from: LocationId,
    pub from_code: String,
    pub to: LocationId,
    pub to_code: String,
    pub amount: f64,
}

/// Source fed to a route at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConsumption {
    pub source: SourceId,
    pub source_name: String,
    pub route: RouteId,
    pub route_name: String,
    pub location: LocationId,
    pub location_code: String,
    pub amount: f64,
}

/// Per-route quantity at a location (urea produced or utility used).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOutput {
    pub route: RouteId,
    pub route_name: String,
    pub location: LocationId,
    pub location_code: String,
    pub amount: f64,
}

/// Urea shipped between two locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UreaShipment {
    pub from: LocationId,
    pub from_code: String,
    pub to: LocationId,
    pub to_code: String,
    pub amount: f64,
}

/// Complete solution to a siting problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantSolution {
    pub status: SolveStatus,
    pub proven_optimal: bool,
    /// Name of the backend that produced the values
    pub backend: String,
    pub selected_location: LocationId,
    pub selected_code: String,
    pub selected_name: String,
    pub sites: Vec<SiteDecision>,
    /// Installed capacity (t/h)
    pub capacity: f64,
    pub capex: f64,
    /// Index of the active CAPEX segment
    pub segment: usize,
    pub npv: NpvBreakdown,
    pub source_sold: Vec<SourceShipment>,
    pub source_used: Vec<SourceConsumption>,
    pub urea_produced: Vec<RouteOutput>,
    pub urea_sold: Vec<UreaShipment>,
    /// Empty unless the parameter set carries utility yields
    pub utility_used: Vec<RouteOutput>,
    pub solve_time: Duration,
    pub stats: ModelStats,
}

impl PlantSolution {
    pub fn total_production(&self) -> f64 {
        self.urea_produced.iter().map(|p| p.amount).sum()
    }

    pub fn total_urea_sold(&self) -> f64 {
        self.urea_sold.iter().map(|u| u.amount).sum()
    }

    /// Total inbound shipments of each source to the plant, by source name.
    pub fn feedstock_received(&self) -> Vec<(String, f64)> {
        let mut totals: Vec<(String, f64)> = Vec::new();
        for s in self.source_sold.iter().filter(|s| s.to == self.selected_location) {
            match totals.iter_mut().find(|(name, _)| *name == s.source_name) {
                Some((_, amount)) => *amount += s.amount,
                None => totals.push((s.source_name.clone(), s.amount)),
            }
        }
        totals
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Plant Siting Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Status: {}\n", self.status));
        s.push_str(&format!("Backend: {}\n", self.backend));
        s.push_str(&format!(
            "Selected Site: {} ({})\n",
            self.selected_name, self.selected_code
        ));
        s.push_str(&format!("Capacity: {:.4} t/h (segment {})\n", self.capacity, self.segment));
        s.push_str(&format!("CAPEX: {:.2}\n", self.capex));
        s.push_str(&format!("Urea Produced: {:.2} t/yr\n", self.total_production()));
        s.push_str(&format!("\nRevenue: {:.2}\n", self.npv.revenue));
        s.push_str(&format!("  Feedstock Cost: {:.2}\n", self.npv.feedstock_cost));
        s.push_str(&format!(
            "  Feedstock Transport: {:.2}\n",
            self.npv.feedstock_transport_cost
        ));
        s.push_str(&format!(
            "  Product Transport: {:.2}\n",
            self.npv.product_transport_cost
        ));
        s.push_str(&format!("Net Cash Flow: {:.2}\n", self.npv.cash_flow));
        s.push_str(&format!(
            "Discounted Cash Flow: {:.2}\n",
            self.npv.discounted_cash_flow
        ));
        s.push_str(&format!("NPV: {:.2}\n", self.npv.npv));
        s.push_str(&format!("Solve Time: {:.2?}\n", self.solve_time));

        let received = self.feedstock_received();
        if !received.is_empty() {
            s.push_str("\nFeedstock Received:\n");
            for (name, amount) in received {
                s.push_str(&format!("  {:<20} {:.2}\n", name, amount));
            }
        }

        if !self.urea_sold.is_empty() {
            s.push_str("\nUrea Deliveries:\n");
            for u in &self.urea_sold {
                s.push_str(&format!("  {} -> {}: {:.2}\n", u.from_code, u.to_code, u.amount));
            }
        }

        s
    }

    /// Re-verify the model invariants on the extracted values.
    ///
    /// Returns one message per violated relation. `tolerance` is relative to
    /// the magnitude of the compared quantities (with a floor of 1).
    pub fn check_invariants(
        &self,
        problem: &SitingProblem,
        tolerance: f64,
    ) -> Result<(), Vec<String>> {
        let params = &problem.params;
        let mut violations = Vec::new();
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0);
        let below = |a: f64, limit: f64| a <= limit + tolerance * limit.abs().max(1.0);

        let installed: Vec<_> = self.sites.iter().filter(|s| s.installed).collect();
        if installed.len() != 1 {
            violations.push(format!("{} plants installed, expected 1", installed.len()));
        } else if installed[0].location != self.selected_location {
            violations.push("selected location does not match installed site".to_string());
        }

        let mut produced: HashMap<(RouteId, LocationId), f64> = HashMap::new();
        let mut production_at: HashMap<LocationId, f64> = HashMap::new();
        for p in &self.urea_produced {
            *produced.entry((p.route, p.location)).or_default() += p.amount;
            *production_at.entry(p.location).or_default() += p.amount;
        }
        for (&l, &amount) in &production_at {
            if l != self.selected_location && !close(amount, 0.0) {
                violations.push(format!(
                    "production {amount} at {} without a plant",
                    params.location(l).code()
                ));
            }
        }

        let mut used: HashMap<(SourceId, RouteId, LocationId), f64> = HashMap::new();
        let mut consumed: HashMap<(SourceId, LocationId), f64> = HashMap::new();
        for u in &self.source_used {
            *used.entry((u.source, u.route, u.location)).or_default() += u.amount;
            *consumed.entry((u.source, u.location)).or_default() += u.amount;
        }
        let mut inbound: HashMap<(SourceId, LocationId), f64> = HashMap::new();
        let mut outbound: HashMap<(SourceId, LocationId), f64> = HashMap::new();
        for s in &self.source_sold {
            *inbound.entry((s.source, s.to)).or_default() += s.amount;
            *outbound.entry((s.source, s.from)).or_default() += s.amount;
        }
        let mut shipped: HashMap<LocationId, f64> = HashMap::new();
        let mut received: HashMap<LocationId, f64> = HashMap::new();
        for u in &self.urea_sold {
            *shipped.entry(u.from).or_default() += u.amount;
            *received.entry(u.to).or_default() += u.amount;
        }
        let utility: HashMap<(RouteId, LocationId), f64> = self
            .utility_used
            .iter()
            .map(|u| ((u.route, u.location), u.amount))
            .collect();

        for l in params.location_ids() {
            let code = params.location(l).code();
            for s in params.source_ids() {
                let name = &params.source(s).name;
                let c = lookup(&consumed, (s, l));
                let i = lookup(&inbound, (s, l));
                if !close(c, i) {
                    violations.push(format!("{name} at {code}: consumed {c} != inbound {i}"));
                }
                let o = lookup(&outbound, (s, l));
                if !below(o, params.supply(s, l)) {
                    violations.push(format!("{name} at {code}: shipped {o} exceeds supply"));
                }
            }

            for r in params.route_ids() {
                let converted: f64 = params
                    .source_ids()
                    .map(|s| lookup(&used, (s, r, l)) * params.conversion_yield(s, r))
                    .sum();
                let p = lookup(&produced, (r, l));
                if !close(p, converted) {
                    violations.push(format!(
                        "{} at {code}: produced {p} != converted {converted}",
                        params.route(r).name
                    ));
                }
                if params.has_utility_yields() {
                    let expected: f64 = params
                        .source_ids()
                        .map(|s| lookup(&used, (s, r, l)) * params.utility_yield(s, r))
                        .sum();
                    let u = lookup(&utility, (r, l));
                    if !close(u, expected) {
                        violations.push(format!(
                            "{} at {code}: utility {u} != expected {expected}",
                            params.route(r).name
                        ));
                    }
                }
            }

            let made = lookup(&production_at, l);
            let out = lookup(&shipped, l);
            if !close(made, out) {
                violations.push(format!("urea at {code}: produced {made} != shipped {out}"));
            }
            let into = lookup(&received, l);
            if !below(into, params.demand(l)) {
                violations.push(format!("urea into {code}: {into} exceeds demand"));
            }
        }

        let link = self.capacity * problem.economics.yearly_hours;
        if !close(self.total_production(), link) {
            violations.push(format!(
                "total production {} != capacity × hours {link}",
                self.total_production()
            ));
        }

        match problem.capex_curve() {
            Ok(curve) => match curve.segments().get(self.segment) {
                Some(seg)
                    if seg.contains(self.capacity, tolerance * seg.upper.max(1.0))
                        && close(self.capex, seg.capex_at(self.capacity)) => {}
                Some(_) => violations.push(format!(
                    "capacity {} / capex {} off segment {}",
                    self.capacity, self.capex, self.segment
                )),
                None => violations.push(format!("segment {} does not exist", self.segment)),
            },
            Err(e) => violations.push(e.to_string()),
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn lookup<K: Eq + Hash>(map: &HashMap<K, f64>, key: K) -> f64 {
    map.get(&key).copied().unwrap_or(0.0)
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;

    pub(crate) fn sample() -> PlantSolution {
        let l1 = LocationId::new(0);
        let l2 = LocationId::new(1);
        let s = SourceId::new(0);
        PlantSolution {
            status: SolveStatus::Optimal,
            proven_optimal: true,
            backend: "microlp".into(),
            selected_location: l1,
            selected_code: "5001".into(),
            selected_name: "Farm".into(),
            sites: vec![
                SiteDecision {
                    location: l1,
                    code: "5001".into(),
                    installed: true,
                    production: 40.5,
                },
                SiteDecision {
                    location: l2,
                    code: "5002".into(),
                    installed: false,
                    production: 0.0,
                },
            ],
            capacity: 0.005,
            capex: 0.0595,
            segment: 0,
            npv: NpvBreakdown {
                revenue: 1000.0,
                npv: 800.0,
                ..NpvBreakdown::default()
            },
            source_sold: vec![
                SourceShipment {
                    source: s,
                    source_name: "rice_husk".into(),
                    from: l1,
                    from_code: "5001".into(),
                    to: l1,
                    to_code: "5001".into(),
                    amount: 30.0,
                },
                SourceShipment {
                    source: s,
                    source_name: "rice_husk".into(),
                    from: l2,
                    from_code: "5002".into(),
                    to: l1,
                    to_code: "5001".into(),
                    amount: 20.0,
                },
            ],
            source_used: vec![],
            urea_produced: vec![],
            urea_sold: vec![UreaShipment {
                from: l1,
                from_code: "5001".into(),
                to: l2,
                to_code: "5002".into(),
                amount: 40.5,
            }],
            utility_used: vec![],
            solve_time: Duration::from_millis(12),
            stats: ModelStats::default(),
        }
    }

    #[test]
    fn test_feedstock_received_groups_by_source() {
        let received = sample().feedstock_received();
        assert_eq!(received, vec![("rice_husk".to_string(), 50.0)]);
    }

    #[test]
    fn test_solution_summary() {
        let summary = sample().summary();
        assert!(summary.contains("Status: Optimal"));
        assert!(summary.contains("Selected Site: Farm (5001)"));
        assert!(summary.contains("NPV: 800.00"));
        assert!(summary.contains("5001 -> 5002: 40.50"));
    }

    #[test]
    fn test_serde_round_trip_keeps_status() {
        let mut solution = sample();
        solution.status = SolveStatus::TimeLimitReached;
        solution.proven_optimal = false;
        let json = serde_json::to_string(&solution).unwrap();
        assert!(json.contains("\"time_limit_reached\""));
        let back: PlantSolution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, SolveStatus::TimeLimitReached);
        assert!(!back.proven_optimal);
        assert_eq!(back.selected_code, "5001");
        assert_eq!(back.urea_sold.len(), 1);
    }
}
