//! Degraded attributions for classifiers without a per-instance method

use super::engine::{AttributionMethod, ExplainError, RawAttribution};
use super::types::AttributionStrategy;
use crate::constants::VALUE_PROXY_SCALE;

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Global importance × instance value
pub struct StaticImportanceMethod {
    importances: Vec<f64>,
}

impl StaticImportanceMethod {
    pub fn new(importances: Vec<f64>) -> Self {
        Self { importances }
    }
}

impl AttributionMethod for StaticImportanceMethod {
    fn strategy(&self) -> AttributionStrategy {
        AttributionStrategy::StaticImportance
    }

    fn attribute(&self, row: &[f64], _target: usize) -> Result<RawAttribution, ExplainError> {
        if row.len() != self.importances.len() {
            return Err(ExplainError::ShapeMismatch {
                expected: self.importances.len(),
                actual: row.len(),
            });
        }
        let contributions = self
            .importances
            .iter()
            .zip(row)
            .map(|(w, x)| finite_or_zero(w * x))
            .collect();
        Ok(RawAttribution {
            base_value: None,
            contributions,
        })
    }
}

/// Non-zero values ranked by magnitude. Not an attribution at all.
pub struct ValueProxyMethod;

impl AttributionMethod for ValueProxyMethod {
    fn strategy(&self) -> AttributionStrategy {
        AttributionStrategy::ValueProxy
    }

    fn attribute(&self, row: &[f64], _target: usize) -> Result<RawAttribution, ExplainError> {
        if row.is_empty() {
            return Err(ExplainError::EmptyInstance);
        }
        let contributions = row.iter().map(|&x| finite_or_zero(x) * VALUE_PROXY_SCALE).collect();
        Ok(RawAttribution {
            base_value: None,
            contributions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importance_scaled_by_value() {
        let method = StaticImportanceMethod::new(vec![0.5, 0.25, 0.25]);
        let raw = method.attribute(&[2.0, f64::NAN, -4.0], 0).unwrap();
        assert_eq!(raw.contributions, vec![1.0, 0.0, -1.0]);
        assert!(raw.base_value.is_none());
        assert!(method.attribute(&[1.0], 0).is_err());
    }

    #[test]
    fn test_value_proxy() {
        let raw = ValueProxyMethod.attribute(&[100.0, 0.0, f64::NAN], 0).unwrap();
        assert!((raw.contributions[0] - 1.0).abs() < 1e-12);
        assert_eq!(raw.contributions[1], 0.0);
        assert_eq!(raw.contributions[2], 0.0);
        assert!(matches!(ValueProxyMethod.attribute(&[], 0), Err(ExplainError::EmptyInstance)));
    }
}
