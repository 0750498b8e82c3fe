//! Classifier abstraction and risk labels

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tree::TreeEnsemble;

// ============================================================================
// RISK LEVEL
// ============================================================================

/// Triage label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Accepts "high", " High ", "high risk"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let word = normalized.strip_suffix(" risk").unwrap_or(&normalized).trim();
        match word {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("unknown risk level '{}'", s)),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("{0} is not supported by this classifier")]
    Unsupported(&'static str),

    #[error("inference failed: {0}")]
    Inference(String),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// A trained classifier over a fixed, named column order.
///
/// Rows passed to `predict`/`predict_proba` are aligned to
/// [`Classifier::feature_names`]; empty cells are NaN.
pub trait Classifier: Send + Sync {
    /// Human-readable kind, e.g. "random_forest"
    fn kind(&self) -> &str;

    fn feature_names(&self) -> &[String];

    /// Class labels in output order, when the artifact records them
    fn classes(&self) -> Option<&[String]> {
        None
    }

    /// Index of the predicted class
    fn predict(&self, row: &[f64]) -> Result<usize, ModelError>;

    fn supports_proba(&self) -> bool {
        false
    }

    fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Unsupported("predict_proba"))
    }

    /// Tree structure usable for exact attribution
    fn tree_ensemble(&self) -> Option<Arc<TreeEnsemble>> {
        None
    }

    /// Global importance per feature, same order as `feature_names`
    fn feature_importances(&self) -> Option<&[f64]> {
        None
    }
}

pub(crate) fn check_width(expected: usize, row: &[f64]) -> Result<(), ModelError> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(ModelError::ShapeMismatch {
            expected,
            actual: row.len(),
        })
    }
}

/// Index of the largest value; first wins on ties, NaN never wins
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
