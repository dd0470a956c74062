//! Installed capacity → CAPEX curve.
//!
//! The curve is a list of contiguous capacity segments, each with its own
//! linear law `capex = base + marginal · (capacity − lower)`. Adjacent
//! segments share their boundary value, so a capacity sitting exactly on a
//! boundary belongs to both.

use crate::error::ModelConsistencyError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacitySegment {
    pub lower: f64,
    pub upper: f64,
    /// CAPEX at `lower`
    pub base_capex: f64,
    /// CAPEX per unit of capacity above `lower`
    pub marginal_capex: f64,
}

impl CapacitySegment {
    pub fn new(lower: f64, upper: f64, base_capex: f64, marginal_capex: f64) -> Self {
        Self {
            lower,
            upper,
            base_capex,
            marginal_capex,
        }
    }

    pub fn contains(&self, capacity: f64, tolerance: f64) -> bool {
        capacity >= self.lower - tolerance && capacity <= self.upper + tolerance
    }

    /// Linear law of this segment, evaluated anywhere on the real line.
    pub fn capex_at(&self, capacity: f64) -> f64 {
        self.base_capex + self.marginal_capex * (capacity - self.lower)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            base_capex: self.base_capex * factor,
            marginal_capex: self.marginal_capex * factor,
            ..*self
        }
    }
}

/// Validated, ordered list of capacity segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapexCurve {
    segments: Vec<CapacitySegment>,
}

impl CapexCurve {
    pub fn new(segments: Vec<CapacitySegment>) -> Result<Self, ModelConsistencyError> {
        if segments.is_empty() {
            return Err(ModelConsistencyError::EmptyCurve);
        }

        for (index, seg) in segments.iter().enumerate() {
            for (field, value) in [
                ("lower", seg.lower),
                ("upper", seg.upper),
                ("base_capex", seg.base_capex),
                ("marginal_capex", seg.marginal_capex),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ModelConsistencyError::InvalidCoefficient {
                        index,
                        field,
                        value,
                    });
                }
            }
            if seg.lower > seg.upper {
                return Err(ModelConsistencyError::InvertedSegment {
                    index,
                    lower: seg.lower,
                    upper: seg.upper,
                });
            }
        }

        for (index, pair) in segments.windows(2).enumerate() {
            if pair[0].upper != pair[1].lower {
                return Err(ModelConsistencyError::NonContiguous {
                    index,
                    upper: pair[0].upper,
                    next: index + 1,
                    next_lower: pair[1].lower,
                });
            }
        }

        Ok(Self { segments })
    }

    /// A curve that pins capacity to `capacity` at a flat `capex`.
    pub fn fixed(capacity: f64, capex: f64) -> Result<Self, ModelConsistencyError> {
        Self::new(vec![CapacitySegment::new(capacity, capacity, capex, 0.0)])
    }

    /// Reference table for a biomass gasification urea unit (capacity in t/h,
    /// CAPEX in millions).
    pub fn reference() -> Self {
        Self {
            segments: vec![
                CapacitySegment::new(0.0, 20.0, 0.0, 11.9),
                CapacitySegment::new(20.0, 35.0, 231.91, 9.12),
                CapacitySegment::new(35.0, 50.0, 368.7, 8.946),
                CapacitySegment::new(50.0, 80.0, 502.89, 8.98),
            ],
        }
    }

    pub fn segments(&self) -> &[CapacitySegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn min_capacity(&self) -> f64 {
        self.segments[0].lower
    }

    pub fn max_capacity(&self) -> f64 {
        self.segments[self.segments.len() - 1].upper
    }

    /// Multiply every CAPEX coefficient by `factor` (e.g. millions → currency units).
    pub fn scaled(&self, factor: f64) -> Result<Self, ModelConsistencyError> {
        Self::new(self.segments.iter().map(|s| s.scaled(factor)).collect())
    }

    /// First segment containing `capacity`, if it lies on the curve's domain.
    pub fn segment_for(&self, capacity: f64) -> Option<usize> {
        self.segments
            .iter()
            .position(|s| s.contains(capacity, 0.0))
    }

    pub fn evaluate(&self, capacity: f64) -> Option<f64> {
        self.segment_for(capacity)
            .map(|i| self.segments[i].capex_at(capacity))
    }

    /// Smallest and largest CAPEX the curve takes over its domain.
    pub fn capex_range(&self) -> (f64, f64) {
        self.segments.iter().fold((f64::INFINITY, 0.0_f64), |(lo, hi), s| {
            let a = s.capex_at(s.lower);
            let b = s.capex_at(s.upper);
            (lo.min(a).min(b), hi.max(a).max(b))
        })
    }

    /// Whether marginal CAPEX is non-decreasing from segment to segment.
    pub fn is_convex(&self) -> bool {
        self.segments
            .windows(2)
            .all(|w| w[0].marginal_capex <= w[1].marginal_capex)
    }
}

impl<'de> Deserialize<'de> for CapexCurve {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let segments = Vec::<CapacitySegment>::deserialize(deserializer)?;
        CapexCurve::new(segments).map_err(serde::de::Error::custom)
    }
}

/// How the plant capacity is decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPlan {
    /// Capacity is a decision variable priced by the curve
    Sized(CapexCurve),
    /// Capacity is pinned to a constant with a flat CAPEX
    Fixed { capacity: f64, capex: f64 },
}

impl CapacityPlan {
    /// The curve the linearizer works on; a fixed plan is a single
    /// zero-width segment.
    pub fn curve(&self) -> Result<CapexCurve, ModelConsistencyError> {
        match self {
            CapacityPlan::Sized(curve) => Ok(curve.clone()),
            CapacityPlan::Fixed { capacity, capex } => CapexCurve::fixed(*capacity, *capex),
        }
    }
}

impl Default for CapacityPlan {
    fn default() -> Self {
        CapacityPlan::Sized(CapexCurve::reference())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_curve_is_valid() {
        let curve = CapexCurve::reference();
        assert_eq!(CapexCurve::new(curve.segments().to_vec()).unwrap(), curve);
        assert_eq!(curve.min_capacity(), 0.0);
        assert_eq!(curve.max_capacity(), 80.0);
        // economies of scale: marginal CAPEX drops after the first segment
        assert!(!curve.is_convex());
    }

    #[test]
    fn test_evaluate_follows_segment_law() {
        let curve = CapexCurve::reference();
        assert!((curve.evaluate(10.0).unwrap() - 119.0).abs() < 1e-9);
        let at_30 = curve.evaluate(30.0).unwrap();
        assert!((at_30 - (231.91 + 10.0 * 9.12)).abs() < 1e-9);
        assert_eq!(curve.evaluate(90.0), None);
    }

    #[test]
    fn test_boundary_belongs_to_both_segments() {
        let curve = CapexCurve::reference();
        assert!(curve.segments()[0].contains(20.0, 0.0));
        assert!(curve.segments()[1].contains(20.0, 0.0));
        assert_eq!(curve.segment_for(20.0), Some(0));
    }

    #[test]
    fn test_non_contiguous_rejected() {
        let err = CapexCurve::new(vec![
            CapacitySegment::new(0.0, 20.0, 0.0, 10.0),
            CapacitySegment::new(25.0, 35.0, 200.0, 9.0),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ModelConsistencyError::NonContiguous {
                index: 0,
                upper: 20.0,
                next: 1,
                next_lower: 25.0
            }
        );
    }

    #[test]
    fn test_inverted_and_negative_rejected() {
        assert!(matches!(
            CapexCurve::new(vec![CapacitySegment::new(5.0, 1.0, 0.0, 1.0)]),
            Err(ModelConsistencyError::InvertedSegment { index: 0, .. })
        ));
        assert!(matches!(
            CapexCurve::new(vec![CapacitySegment::new(0.0, 1.0, 0.0, -1.0)]),
            Err(ModelConsistencyError::InvalidCoefficient {
                field: "marginal_capex",
                ..
            })
        ));
        assert_eq!(
            CapexCurve::new(vec![]).unwrap_err(),
            ModelConsistencyError::EmptyCurve
        );
    }

    #[test]
    fn test_capex_range_and_scaling() {
        let curve = CapexCurve::reference();
        let (lo, hi) = curve.capex_range();
        assert_eq!(lo, 0.0);
        assert!((hi - (502.89 + 30.0 * 8.98)).abs() < 1e-9);

        let scaled = curve.scaled(1e6).unwrap();
        assert!((scaled.evaluate(10.0).unwrap() - 119.0e6).abs() < 1e-3);
    }

    #[test]
    fn test_fixed_plan_is_zero_width_segment() {
        let plan = CapacityPlan::Fixed {
            capacity: 20.0,
            capex: 250.0,
        };
        let curve = plan.curve().unwrap();
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.min_capacity(), 20.0);
        assert_eq!(curve.max_capacity(), 20.0);
        assert_eq!(curve.evaluate(20.0), Some(250.0));
    }

    #[test]
    fn test_deserialize_validates() {
        let bad = r#"[{"lower":0.0,"upper":10.0,"base_capex":0.0,"marginal_capex":1.0},
                      {"lower":12.0,"upper":20.0,"base_capex":10.0,"marginal_capex":1.0}]"#;
        assert!(serde_json::from_str::<CapexCurve>(bad).is_err());
    }
}
