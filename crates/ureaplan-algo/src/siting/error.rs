//! Siting errors

use super::solution::PlantSolution;
use thiserror::Error;
use ureaplan_core::{ModelConsistencyError, UreaError, ValidationError};

/// Errors raised while assembling or solving a siting model.
#[derive(Error, Debug)]
pub enum SitingError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("model consistency error: {0}")]
    ModelConsistency(#[from] ModelConsistencyError),

    /// No assignment satisfies every constraint
    #[error("{backend}: model is infeasible")]
    Infeasible { backend: &'static str },

    /// Should not happen with bounded supply and demand
    #[error("{backend}: objective is unbounded")]
    Unbounded { backend: &'static str },

    /// Wall-clock limit hit; the best assignment found is attached
    #[error("time limit of {limit_seconds}s reached, best NPV {:.2} not proven optimal", .best.npv.npv)]
    TimeLimit {
        limit_seconds: f64,
        best: Box<PlantSolution>,
    },

    #[error("solver failed: {0}")]
    Solver(String),
}

impl SitingError {
    /// Best-found solution carried by a time-limit outcome.
    pub fn best_solution(&self) -> Option<&PlantSolution> {
        match self {
            SitingError::TimeLimit { best, .. } => Some(best),
            _ => None,
        }
    }
}

impl From<SitingError> for UreaError {
    fn from(err: SitingError) -> Self {
        match err {
            SitingError::Validation(e) => UreaError::Validation(e),
            SitingError::ModelConsistency(e) => UreaError::ModelConsistency(e),
            other => UreaError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_backend() {
        let err = SitingError::Infeasible { backend: "microlp" };
        assert_eq!(err.to_string(), "microlp: model is infeasible");
    }

    #[test]
    fn test_into_unified_error() {
        let err: UreaError = SitingError::from(ValidationError::EmptySelection).into();
        assert!(matches!(err, UreaError::Validation(ValidationError::EmptySelection)));

        let err: UreaError = SitingError::Solver("boom".into()).into();
        assert_eq!(err.to_string(), "solver failed: boom");
    }
}
