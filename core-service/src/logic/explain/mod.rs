//! Attribution Engine - why a prediction came out the way it did
//!
//! Strategies, best first: exact tree attribution, permutation sampling,
//! static importance, value proxy. Every report names its strategy.

pub mod capability;
pub mod engine;
pub mod fallback;
pub mod sampling;
pub mod tree_shap;
pub mod types;

pub use capability::ModelCapability;
pub use engine::{summarize_risk_factors, AttributionMethod, ExplainError, Explainer, ExplainerConfig, RawAttribution};
pub use sampling::Background;
pub use types::{AttributionReport, AttributionStrategy, FeatureAttribution, Impact, RiskFactorSummary};
