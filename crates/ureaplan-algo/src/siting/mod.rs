//! Urea Plant Siting and Sizing
//!
//! This module builds and solves a Mixed-Integer Linear Programming (MILP)
//! model that picks one location for a biomass-to-urea plant, sizes it, and
//! routes feedstock in and urea out so as to maximise net present value.
//!
//! ## Problem Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UREA PLANT SITING                                                       │
//! │  ─────────────────                                                       │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Locations with feedstock supply, prices and urea demand            │
//! │    • Pairwise road distances                                            │
//! │    • Conversion routes with per-source urea and utility yields          │
//! │    • A piecewise-linear capacity → CAPEX curve                          │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • Which single location hosts the plant (binary)                     │
//! │    • Plant capacity and the active CAPEX segment                        │
//! │    • Feedstock shipments, route inputs and urea shipments (continuous)  │
//! │                                                                          │
//! │  Maximise:                                                               │
//! │    NPV = annuity · (revenue − feedstock − transport) − CAPEX            │
//! │                                                                          │
//! │  Subject to:                                                             │
//! │    • Feedstock balance and supply limits at each location               │
//! │    • Route conversion yields                                            │
//! │    • Urea balance and demand limits                                     │
//! │    • Production only at the selected site                               │
//! │    • Capacity/CAPEX on exactly one curve segment                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## MILP Formulation
//!
//! ```text
//! maximise   A · ( Σ p_u(to)·u[from,to]
//!                − Σ c(s,·)·feedstock
//!                − τ Σ d(from,to)·(x[s,from,to] + u[from,to]) ) − K
//!
//! subject to:
//!   Σ_r w[s,r,l] = Σ_from x[s,from,l]                Source balance
//!   Σ_to x[s,l,to] ≤ S(s,l)                          Supply limit
//!   q[r,l] = Σ_s η(s,r) · w[s,r,l]                   Conversion ratio
//!   Σ_r q[r,l] = Σ_to u[l,to]                        Urea balance
//!   Σ_from u[from,l] ≤ D(l)                          Demand limit
//!   Σ_l y_l = 1                                      One plant
//!   Σ_r q[r,l] ≤ M · y_l                             Production only where built
//!   Σ_{r,l} q[r,l] = H · C                           Capacity link
//!   Σ_i z_i = 1                                      One CAPEX segment
//!   lo_i − s(1−z_i) ≤ C ≤ hi_i + s(1−z_i)             Segment capacity range
//!   |K − a_i − b_i(C − lo_i)| ≤ s_K (1−z_i)          Segment CAPEX law
//! ```
//!
//! `A` is the annuity factor `(1 − (1+r)^−T) / r`, `τ` the per tonne-km
//! transport rate (trip price over vehicle capacity). Power sources are not
//! trucked and carry no transport cost.
//!
//! ## Segment Slacks
//!
//! Each CAPEX segment gets its own relaxation sized from the curve, so a
//! deselected segment never cuts off a point that another segment admits.
//! The production bound `M` is derived from the largest capacity and total
//! demand unless overridden, and an override smaller than the derived bound
//! is rejected.

mod capex;
mod error;
mod model;
mod network;
mod objective;
mod problem;
mod solution;
mod solver;

pub use capex::{CapexRegime, CapexVariables, PiecewiseCapex};
pub use error::SitingError;
pub use model::{ConstraintFamily, ModelStats, SitingModel, TaggedConstraint};
pub use network::FlowVariables;
pub use objective::{NpvTerms, SitingVariables};
pub use problem::{Economics, FeedstockPricing, SitingProblem, SitingProblemBuilder};
pub use solution::{
    NpvBreakdown, PlantSolution, RouteOutput, SiteDecision, SolveStatus, SourceConsumption,
    SourceShipment, UreaShipment, FLOW_EPSILON,
};
pub use solver::{solve_siting, MilpBackend, SolverConfig};
