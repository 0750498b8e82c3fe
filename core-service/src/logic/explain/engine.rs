//! Explainer - ordered attribution plan with fall-through
//!
//! The plan is fixed at startup from the classifier's capability. Each call
//! tries the methods in order; the first success is ranked, truncated and
//! labelled with the strategy that produced it. Total failure is a report
//! with `success: false`, never an error.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::capability::ModelCapability;
use super::fallback::{StaticImportanceMethod, ValueProxyMethod};
use super::sampling::{Background, SamplingMethod};
use super::tree_shap::TreeExactMethod;
use super::types::{AttributionReport, AttributionStrategy, FeatureAttribution, Impact, RiskFactorSummary};
use crate::constants::{
    get_background_rows, get_permutations, ATTRIBUTION_SEED, DEFAULT_BACKGROUND_ROWS, DEFAULT_PERMUTATIONS,
    DEFAULT_SAMPLING_BUDGET_MS,
};
use crate::logic::model::{Classifier, ModelError, RiskLevel};

// ============================================================================
// METHOD CONTRACT
// ============================================================================

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("no output for class index {0}")]
    InvalidTarget(usize),

    #[error("empty instance")]
    EmptyInstance,

    #[error("time budget of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("background data: {0}")]
    Background(String),
}

/// Dense, unranked contributions in the classifier's column order
#[derive(Debug, Clone, PartialEq)]
pub struct RawAttribution {
    pub base_value: Option<f64>,
    pub contributions: Vec<f64>,
}

pub trait AttributionMethod: Send + Sync {
    fn strategy(&self) -> AttributionStrategy;

    /// Contributions of `row` towards output `target`
    fn attribute(&self, row: &[f64], target: usize) -> Result<RawAttribution, ExplainError>;
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    pub permutations: usize,
    pub seed: u64,
    pub background_rows: usize,
    pub sampling_budget: Duration,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            permutations: DEFAULT_PERMUTATIONS,
            seed: ATTRIBUTION_SEED,
            background_rows: DEFAULT_BACKGROUND_ROWS,
            sampling_budget: Duration::from_millis(DEFAULT_SAMPLING_BUDGET_MS),
        }
    }
}

impl ExplainerConfig {
    pub fn from_env() -> Self {
        Self {
            permutations: get_permutations(),
            background_rows: get_background_rows(),
            ..Self::default()
        }
    }
}

// ============================================================================
// EXPLAINER
// ============================================================================

pub struct Explainer {
    feature_names: Vec<String>,
    labels: Vec<RiskLevel>,
    target: usize,
    capability: &'static str,
    methods: Vec<Box<dyn AttributionMethod>>,
}

/// Output index explained: the high-risk class, else the most severe label
fn target_index(labels: &[RiskLevel]) -> Option<usize> {
    labels
        .iter()
        .position(|l| *l == RiskLevel::High)
        .or_else(|| labels.iter().enumerate().max_by_key(|(_, l)| **l).map(|(i, _)| i))
}

impl Explainer {
    /// Build the method plan eagerly. Sampling needs probabilities; a
    /// background that cannot be scored only drops that method.
    pub fn build(
        classifier: Arc<dyn Classifier>,
        labels: &[RiskLevel],
        config: &ExplainerConfig,
        background: Option<Background>,
    ) -> Result<Self, ExplainError> {
        let capability = ModelCapability::detect(classifier.as_ref());
        let width = classifier.feature_names().len();
        let mut methods: Vec<Box<dyn AttributionMethod>> = Vec::new();

        if let ModelCapability::TreeAttributable(ensemble) = &capability {
            methods.push(Box::new(TreeExactMethod::new(Arc::clone(ensemble))));
        }

        if classifier.supports_proba() {
            let background = background.unwrap_or_else(|| Background::zeros(width));
            match SamplingMethod::new(
                Arc::clone(&classifier),
                background,
                config.permutations,
                config.seed,
                config.sampling_budget,
            ) {
                Ok(method) => methods.push(Box::new(method)),
                Err(e) => log::warn!("Sampling attribution disabled: {}", e),
            }
        }

        if let Some(importances) = classifier.feature_importances() {
            if importances.len() == width {
                methods.push(Box::new(StaticImportanceMethod::new(importances.to_vec())));
            }
        }

        methods.push(Box::new(ValueProxyMethod));

        Self::from_methods(classifier.feature_names().to_vec(), labels.to_vec(), methods)
            .map(|explainer| explainer.with_capability(capability.kind()))
    }

    pub fn from_methods(
        feature_names: Vec<String>,
        labels: Vec<RiskLevel>,
        methods: Vec<Box<dyn AttributionMethod>>,
    ) -> Result<Self, ExplainError> {
        let target = target_index(&labels).ok_or(ExplainError::InvalidTarget(0))?;
        Ok(Self {
            feature_names,
            labels,
            target,
            capability: "custom",
            methods,
        })
    }

    fn with_capability(mut self, capability: &'static str) -> Self {
        self.capability = capability;
        self
    }

    pub fn capability(&self) -> &'static str {
        self.capability
    }

    /// Strategies in the order they are tried
    pub fn strategies(&self) -> Vec<AttributionStrategy> {
        self.methods.iter().map(|m| m.strategy()).collect()
    }

    pub fn target_label(&self) -> RiskLevel {
        self.labels[self.target]
    }

    /// Ranked contributions for an aligned row
    pub fn explain(&self, row: &[f64], top_k: usize) -> AttributionReport {
        let total = self.feature_names.len();
        if row.len() != total {
            return AttributionReport::unavailable(
                ExplainError::ShapeMismatch {
                    expected: total,
                    actual: row.len(),
                }
                .to_string(),
                total,
            );
        }

        let mut failures = Vec::new();
        for method in &self.methods {
            let strategy = method.strategy();
            match method.attribute(row, self.target) {
                Ok(raw) if raw.contributions.len() == total && raw.contributions.iter().all(|c| c.is_finite()) => {
                    if !failures.is_empty() {
                        log::warn!("Attribution fell through to {}: {}", strategy.as_str(), failures.join("; "));
                    }
                    return self.report(strategy, raw, row, top_k);
                }
                Ok(_) => failures.push(format!("{}: malformed contributions", strategy.as_str())),
                Err(e) => failures.push(format!("{}: {}", strategy.as_str(), e)),
            }
        }

        log::warn!("Attribution unavailable: {}", failures.join("; "));
        AttributionReport::unavailable(failures.join("; "), total)
    }

    fn report(&self, strategy: AttributionStrategy, raw: RawAttribution, row: &[f64], top_k: usize) -> AttributionReport {
        let mut features: Vec<FeatureAttribution> = self
            .feature_names
            .iter()
            .zip(row)
            .zip(&raw.contributions)
            .map(|((name, &value), &contribution)| FeatureAttribution {
                feature: name.clone(),
                feature_value: value.is_finite().then_some(value),
                contribution,
                abs_contribution: contribution.abs(),
                impact: Impact::from_contribution(contribution),
            })
            .collect();

        // The proxy only ranks features that are actually set
        if strategy == AttributionStrategy::ValueProxy {
            features.retain(|f| f.contribution != 0.0);
        }

        // Stable: ties keep column order
        features.sort_by(|a, b| b.abs_contribution.total_cmp(&a.abs_contribution));
        features.truncate(top_k);

        AttributionReport {
            success: true,
            strategy,
            per_instance: strategy.is_per_instance(),
            base_value: raw.base_value,
            target_class: Some(self.labels[self.target].to_string()),
            top_features: features,
            total_features_analyzed: self.feature_names.len(),
            note: strategy.note().map(str::to_string),
            error: None,
        }
    }
}

/// "Feature Name (0.123)" lines split by direction
pub fn summarize_risk_factors(report: &AttributionReport) -> RiskFactorSummary {
    let mut summary = RiskFactorSummary::default();
    if !report.success {
        return summary;
    }

    for feature in &report.top_features {
        let line = format!("{} ({:.3})", display_name(&feature.feature), feature.abs_contribution);
        match feature.impact {
            Impact::IncreasesRisk => summary.increasing_risk.push(line),
            Impact::DecreasesRisk => summary.decreasing_risk.push(line),
            Impact::Neutral => {}
        }
    }
    summary
}

/// `social_support_index` → `Social Support Index`; existing capitals kept
fn display_name(feature: &str) -> String {
    feature
        .split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::artifact::{tests::forest_json, ArtifactEnvelope};
    use crate::logic::model::inference::resolve_labels;

    struct Failing(AttributionStrategy);

    impl AttributionMethod for Failing {
        fn strategy(&self) -> AttributionStrategy {
            self.0
        }
        fn attribute(&self, _row: &[f64], _target: usize) -> Result<RawAttribution, ExplainError> {
            Err(ExplainError::Model(ModelError::Inference("broken".to_string())))
        }
    }

    struct Fixed(Vec<f64>);

    impl AttributionMethod for Fixed {
        fn strategy(&self) -> AttributionStrategy {
            AttributionStrategy::StaticImportance
        }
        fn attribute(&self, _row: &[f64], _target: usize) -> Result<RawAttribution, ExplainError> {
            Ok(RawAttribution {
                base_value: None,
                contributions: self.0.clone(),
            })
        }
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("feature_{}", i)).collect()
    }

    fn forest() -> Arc<dyn Classifier> {
        let envelope: ArtifactEnvelope = serde_json::from_value(forest_json()).unwrap();
        Arc::from(envelope.build().unwrap())
    }

    #[test]
    fn test_forest_plan_and_exact_report() {
        let classifier = forest();
        let labels = resolve_labels(classifier.as_ref()).unwrap();
        let explainer = Explainer::build(classifier, &labels, &ExplainerConfig::default(), None).unwrap();

        assert_eq!(explainer.capability(), "tree_attributable");
        assert_eq!(
            explainer.strategies(),
            vec![
                AttributionStrategy::TreeExact,
                AttributionStrategy::Sampling,
                AttributionStrategy::StaticImportance,
                AttributionStrategy::ValueProxy,
            ]
        );
        assert_eq!(explainer.target_label(), RiskLevel::High);

        let report = explainer.explain(&[12.0, 0.9], 10);
        assert!(report.success);
        assert!(report.per_instance);
        assert_eq!(report.strategy, AttributionStrategy::TreeExact);
        assert_eq!(report.target_class.as_deref(), Some("high"));
        assert!((report.base_value.unwrap() - 0.3).abs() < 1e-12);

        let top = &report.top_features[0];
        assert_eq!(top.feature, "PHQ9 Score");
        assert!((top.contribution - 0.7).abs() < 1e-12);
        assert_eq!(top.impact, Impact::IncreasesRisk);
        assert_eq!(report.top_features[1].impact, Impact::Neutral);
    }

    #[test]
    fn test_falls_through_to_next_strategy() {
        let explainer = Explainer::from_methods(
            names(3),
            vec![RiskLevel::Low, RiskLevel::High],
            vec![
                Box::new(Failing(AttributionStrategy::TreeExact)),
                Box::new(Failing(AttributionStrategy::Sampling)),
                Box::new(Fixed(vec![0.1, -0.5, 0.0])),
            ],
        )
        .unwrap();

        let report = explainer.explain(&[1.0, 2.0, 3.0], 10);
        assert!(report.success);
        assert!(!report.per_instance);
        assert_eq!(report.strategy, AttributionStrategy::StaticImportance);
        assert!(report.note.is_some());
        assert_eq!(report.top_features[0].feature, "feature_1");
        assert_eq!(report.top_features[0].impact, Impact::DecreasesRisk);
        assert_eq!(report.top_features[2].impact, Impact::Neutral);
    }

    #[test]
    fn test_total_failure_is_a_report() {
        let explainer = Explainer::from_methods(
            names(2),
            vec![RiskLevel::High],
            vec![
                Box::new(Failing(AttributionStrategy::TreeExact)),
                Box::new(Fixed(vec![f64::NAN, 0.0])),
            ],
        )
        .unwrap();

        let report = explainer.explain(&[1.0, 2.0], 10);
        assert!(!report.success);
        assert_eq!(report.strategy, AttributionStrategy::Unavailable);
        assert!(report.error.unwrap().contains("broken"));

        let wrong_width = explainer.explain(&[1.0], 10);
        assert!(!wrong_width.success);
    }

    #[test]
    fn test_top_k_truncates_by_magnitude() {
        let explainer = Explainer::from_methods(
            names(4),
            vec![RiskLevel::High],
            vec![Box::new(Fixed(vec![0.1, -0.9, 0.5, 0.0]))],
        )
        .unwrap();
        let report = explainer.explain(&[0.0; 4], 2);
        let order: Vec<&str> = report.top_features.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(order, vec!["feature_1", "feature_2"]);
        assert_eq!(report.total_features_analyzed, 4);
    }

    #[test]
    fn test_value_proxy_skips_unset_features() {
        let explainer = Explainer::from_methods(
            names(5),
            vec![RiskLevel::High],
            vec![Box::new(Failing(AttributionStrategy::TreeExact)), Box::new(ValueProxyMethod)],
        )
        .unwrap();

        let report = explainer.explain(&[0.0, 5.0, 0.0, -20.0, f64::NAN], 10);
        assert!(report.success);
        assert_eq!(report.strategy, AttributionStrategy::ValueProxy);
        assert!(!report.per_instance);
        let order: Vec<&str> = report.top_features.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(order, vec!["feature_3", "feature_1"]);
        assert!(report.top_features.iter().all(|f| f.impact != Impact::Neutral));

        let report = explainer.explain(&[0.0; 5], 3);
        assert!(report.success);
        assert!(report.top_features.is_empty());
    }

    #[test]
    fn test_target_without_high_label() {
        assert_eq!(target_index(&[RiskLevel::Low, RiskLevel::Medium]), Some(1));
        assert_eq!(target_index(&[RiskLevel::Low, RiskLevel::High, RiskLevel::Medium]), Some(1));
        assert_eq!(target_index(&[]), None);
    }

    #[test]
    fn test_summary_lines() {
        let explainer = Explainer::from_methods(
            vec!["social_support_index".to_string(), "PHQ9 Score".to_string(), "Age".to_string()],
            vec![RiskLevel::High],
            vec![Box::new(Fixed(vec![-0.25, 0.1234, 0.0]))],
        )
        .unwrap();
        let summary = summarize_risk_factors(&explainer.explain(&[0.5, 12.0, 30.0], 10));
        assert_eq!(summary.increasing_risk, vec!["PHQ9 Score (0.123)"]);
        assert_eq!(summary.decreasing_risk, vec!["Social Support Index (0.250)"]);

        let failed = AttributionReport::unavailable("nope", 3);
        assert_eq!(summarize_risk_factors(&failed), RiskFactorSummary::default());
    }
}
