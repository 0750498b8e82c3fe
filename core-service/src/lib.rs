//! MindBloom Core - Postpartum Depression Risk Triage
//!
//! Pure computation behind the triage service: answers in, risk label,
//! probabilities and a ranked attribution out.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  AnswerSet   │──▶│  derivation   │──▶│  prediction  │──▶│ attribution │
//! │ (questions)  │   │ (54 features) │   │ (classifier) │   │  (ranked)   │
//! └──────────────┘   └───────────────┘   └──────────────┘   └─────────────┘
//! ```
//!
//! Persistence and the HTTP surface live in the server crate.

pub mod constants;
pub mod engine;
pub mod logic;

pub use engine::{EngineConfig, StartupError, TriageEngine};
pub use logic::encoding::LabelEncodingTable;
pub use logic::explain::{AttributionReport, AttributionStrategy, Explainer, RiskFactorSummary};
pub use logic::features::{AnswerSet, FeatureDeriver, FeatureValue, FeatureVector};
pub use logic::model::{Classifier, PredictionResult, PredictionService, RiskLevel};
