//! Error types shared across the ureaplan crates
//!
//! Two families are raised while a run is being set up:
//!
//! - [`ValidationError`]: the input tables are malformed or incomplete.
//! - [`ModelConsistencyError`]: a configuration contract is broken (CAPEX
//!   segments that do not tile the capacity axis, a big-M that would cut off
//!   feasible points, ...).
//!
//! Both are fatal for the run. [`UreaError`] wraps them together with I/O and
//! parsing failures so the loaders and the CLI can use a single `?` path.

use thiserror::Error;

/// Malformed or incomplete input tables.
///
/// Every variant names the offending key so the problem can be located
/// without re-reading the raw tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing {table} entry for {key}")]
    MissingEntry { table: &'static str, key: String },

    #[error("negative {table} value {value} for {key}")]
    NegativeValue {
        table: &'static str,
        key: String,
        value: f64,
    },

    #[error("non-finite {table} value for {key}")]
    NonFinite { table: &'static str, key: String },

    #[error("asymmetric distance {from} -> {to}: {forward} vs {backward}")]
    AsymmetricDistance {
        from: String,
        to: String,
        forward: f64,
        backward: f64,
    },

    #[error("self-distance at {location} must be positive, got {value}")]
    NonPositiveSelfDistance { location: String, value: f64 },

    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    #[error("no {0} declared")]
    EmptySet(&'static str),

    #[error("location filter matched no locations")]
    EmptySelection,

    #[error("unknown location '{0}'")]
    UnknownLocation(String),
}

/// Internal contract violations in the model configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelConsistencyError {
    #[error("capex curve has no segments")]
    EmptyCurve,

    #[error("capacity segment {index} has lower bound {lower} above upper bound {upper}")]
    InvertedSegment {
        index: usize,
        lower: f64,
        upper: f64,
    },

    #[error("capacity segment {index} ends at {upper} but segment {next} starts at {next_lower}")]
    NonContiguous {
        index: usize,
        upper: f64,
        next: usize,
        next_lower: f64,
    },

    #[error("capacity segment {index}: {field} must be finite and non-negative, got {value}")]
    InvalidCoefficient {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("big-M for {name} is {given}, below the derived bound {required}")]
    BigMTooSmall {
        name: &'static str,
        given: f64,
        required: f64,
    },

    #[error("invalid economics: {0}")]
    InvalidEconomics(String),
}

/// Unified error type for ureaplan operations.
#[derive(Error, Debug)]
pub enum UreaError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Model consistency error: {0}")]
    ModelConsistency(#[from] ModelConsistencyError),

    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing of input tables or configuration files
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using UreaError.
pub type UreaResult<T> = Result<T, UreaError>;

impl From<anyhow::Error> for UreaError {
    fn from(err: anyhow::Error) -> Self {
        UreaError::Other(err.to_string())
    }
}

impl From<String> for UreaError {
    fn from(s: String) -> Self {
        UreaError::Other(s)
    }
}
