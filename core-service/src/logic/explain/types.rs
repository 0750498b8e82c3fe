use serde::{Deserialize, Serialize};

/// How a set of contributions was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionStrategy {
    /// Exact Shapley values over the tree structure
    TreeExact,
    /// Permutation-sampled Shapley values against a background set
    Sampling,
    /// Global importance scaled by the instance's values
    StaticImportance,
    /// Raw feature values, scaled down
    ValueProxy,
    Unavailable,
}

impl AttributionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributionStrategy::TreeExact => "tree_exact",
            AttributionStrategy::Sampling => "sampling",
            AttributionStrategy::StaticImportance => "static_importance",
            AttributionStrategy::ValueProxy => "value_proxy",
            AttributionStrategy::Unavailable => "unavailable",
        }
    }

    /// Only Shapley-style strategies explain this particular prediction
    pub fn is_per_instance(self) -> bool {
        matches!(self, AttributionStrategy::TreeExact | AttributionStrategy::Sampling)
    }

    pub fn note(self) -> Option<&'static str> {
        match self {
            AttributionStrategy::StaticImportance => {
                Some("Approximation: global feature importance scaled by this instance's values")
            }
            AttributionStrategy::ValueProxy => Some("Approximation: feature values only, not model attributions"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    IncreasesRisk,
    DecreasesRisk,
    Neutral,
}

impl Impact {
    pub fn from_contribution(value: f64) -> Self {
        if value > 0.0 {
            Impact::IncreasesRisk
        } else if value < 0.0 {
            Impact::DecreasesRisk
        } else {
            Impact::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature: String,
    /// `None` when the aligned cell was empty
    pub feature_value: Option<f64>,
    pub contribution: f64,
    pub abs_contribution: f64,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionReport {
    pub success: bool,
    pub strategy: AttributionStrategy,
    pub per_instance: bool,
    /// Expected model output for the target class, when known
    pub base_value: Option<f64>,
    pub target_class: Option<String>,
    pub top_features: Vec<FeatureAttribution>,
    pub total_features_analyzed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AttributionReport {
    pub fn unavailable(error: impl Into<String>, total_features: usize) -> Self {
        Self {
            success: false,
            strategy: AttributionStrategy::Unavailable,
            per_instance: false,
            base_value: None,
            target_class: None,
            top_features: Vec::new(),
            total_features_analyzed: total_features,
            note: None,
            error: Some(error.into()),
        }
    }
}

/// Human-readable split of a report, "Feature (0.123)" per entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactorSummary {
    pub increasing_risk: Vec<String>,
    pub decreasing_risk: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_serializes_snake_case() {
        let json = serde_json::to_string(&AttributionStrategy::StaticImportance).unwrap();
        assert_eq!(json, "\"static_importance\"");
        assert_eq!(AttributionStrategy::TreeExact.as_str(), "tree_exact");
    }

    #[test]
    fn test_per_instance_flags() {
        assert!(AttributionStrategy::TreeExact.is_per_instance());
        assert!(AttributionStrategy::Sampling.is_per_instance());
        assert!(!AttributionStrategy::StaticImportance.is_per_instance());
        assert!(!AttributionStrategy::ValueProxy.is_per_instance());
        assert!(AttributionStrategy::ValueProxy.note().is_some());
        assert!(AttributionStrategy::TreeExact.note().is_none());
    }

    #[test]
    fn test_impact_sign() {
        assert_eq!(Impact::from_contribution(0.2), Impact::IncreasesRisk);
        assert_eq!(Impact::from_contribution(-0.2), Impact::DecreasesRisk);
        assert_eq!(Impact::from_contribution(0.0), Impact::Neutral);
    }
}
