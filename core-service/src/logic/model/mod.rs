//! Model Module - classifier artifacts and the prediction service
//!
//! Artifacts are loaded once at startup; everything downstream sees an
//! `Arc<dyn Classifier>`.

pub mod artifact;
pub mod classifier;
pub mod inference;
pub mod linear;
pub mod onnx;
pub mod tree;
pub mod voting;

pub use artifact::{load_model, ArtifactError, LoadedModel, ModelMetadata};
pub use classifier::{argmax, Classifier, ModelError, RiskLevel};
pub use inference::{AlignedRow, EngineStatus, PredictionError, PredictionResult, PredictionService};
pub use tree::{DecisionTree, ForestClassifier, TreeEnsemble};
