//! # ureaplan-algo: Plant Siting Optimisation
//!
//! Builds the single-plant siting and sizing MILP over a
//! [`ureaplan_core::ParameterSet`] and solves it with a `good_lp` backend.
//!
//! ## Backends
//!
//! | Backend | Feature | Time limit / MIP gap |
//! |---------|---------|----------------------|
//! | [`MilpBackend::Microlp`] | always | ignored with a warning |
//! | `MilpBackend::Highs` | `solver-highs` | honoured |
//!
//! ## Example
//!
//! ```ignore
//! use ureaplan_algo::{solve_siting, SitingProblemBuilder, SolverConfig};
//!
//! let problem = SitingProblemBuilder::new(params)
//!     .discounting(0.10, 20)
//!     .transport(6.36, 60.0)
//!     .build();
//! let solution = solve_siting(&problem, &SolverConfig::default())?;
//! println!("{}", solution.summary());
//! ```

pub mod siting;

pub use siting::*;
