//! Model Artifacts - loading classifiers from disk
//!
//! Two formats:
//! - `*.onnx`: ONNX Runtime session plus a JSON schema sidecar
//! - anything else: JSON envelope describing a forest, logistic model or
//!   soft-voting ensemble of those
//!
//! Every artifact is SHA-256 fingerprinted so status endpoints and logs can
//! tell exactly which model answered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::classifier::Classifier;
use super::linear::{LogisticArrays, LogisticClassifier};
use super::onnx::{OnnxClassifier, OnnxSchema};
use super::tree::{ForestClassifier, TreeArrays, TreeEnsemble};
use super::voting::VotingClassifier;

/// Envelope format understood by this build
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed model artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("onnx runtime error: {0}")]
    Onnx(String),
}

// ============================================================================
// JSON FORMAT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub format_version: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    pub model: ModelSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Forest {
        trees: Vec<TreeArrays>,
        #[serde(default)]
        feature_importances: Option<Vec<f64>>,
    },
    Logistic(LogisticArrays),
    Voting {
        members: Vec<ModelSpec>,
        #[serde(default)]
        weights: Option<Vec<f64>>,
    },
}

impl ModelSpec {
    fn build(&self, feature_names: &[String], classes: &[String]) -> Result<Box<dyn Classifier>, ArtifactError> {
        let n_features = feature_names.len();
        let n_classes = classes.len();

        let classifier: Box<dyn Classifier> = match self {
            ModelSpec::Forest {
                trees,
                feature_importances,
            } => {
                let ensemble = TreeEnsemble::from_arrays(trees, n_features, n_classes)?;
                Box::new(ForestClassifier::new(
                    feature_names.to_vec(),
                    classes.to_vec(),
                    ensemble,
                    feature_importances.clone(),
                )?)
            }
            ModelSpec::Logistic(arrays) => Box::new(LogisticClassifier::new(
                feature_names.to_vec(),
                classes.to_vec(),
                arrays.clone(),
            )?),
            ModelSpec::Voting { members, weights } => {
                let members = members
                    .iter()
                    .map(|m| m.build(feature_names, classes))
                    .collect::<Result<Vec<_>, _>>()?;
                Box::new(VotingClassifier::new(
                    feature_names.to_vec(),
                    classes.to_vec(),
                    members,
                    weights.clone(),
                )?)
            }
        };
        Ok(classifier)
    }
}

impl ArtifactEnvelope {
    pub fn build(&self) -> Result<Box<dyn Classifier>, ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::Invalid(format!(
                "unsupported format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if self.feature_names.is_empty() {
            return Err(ArtifactError::Invalid("no feature names".to_string()));
        }
        if self.classes.is_empty() {
            return Err(ArtifactError::Invalid("no classes".to_string()));
        }
        self.model.build(&self.feature_names, &self.classes)
    }
}

// ============================================================================
// LOADED MODEL
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_name: String,
    pub model_kind: String,
    /// SHA-256 of the artifact bytes, hex
    pub checksum: String,
    pub features: usize,
    pub classes: Vec<String>,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

pub struct LoadedModel {
    pub classifier: Arc<dyn Classifier>,
    pub metadata: ModelMetadata,
}

pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Default sidecar location: `model.onnx` → `model.schema.json`
pub fn default_schema_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("schema.json")
}

/// Load a classifier artifact. Any failure is a startup failure.
pub fn load_model(path: &Path, schema_path: Option<&Path>) -> Result<LoadedModel, ArtifactError> {
    log::info!("Loading model artifact from: {}", path.display());

    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let digest = checksum(&bytes);
    let is_onnx = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("onnx"));

    let (classifier, name): (Arc<dyn Classifier>, String) = if is_onnx {
        let schema_path = schema_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_schema_path(path));
        let schema = OnnxSchema::load(&schema_path)?;
        let name = schema.name.clone().unwrap_or_else(|| file_stem(path));
        (Arc::new(OnnxClassifier::load(path, schema)?), name)
    } else {
        let envelope: ArtifactEnvelope = serde_json::from_slice(&bytes)?;
        let name = envelope.name.clone().unwrap_or_else(|| file_stem(path));
        (Arc::from(envelope.build()?), name)
    };

    let metadata = ModelMetadata {
        model_path: path.display().to_string(),
        model_name: name,
        model_kind: classifier.kind().to_string(),
        checksum: digest,
        features: classifier.feature_names().len(),
        classes: classifier.classes().map(<[String]>::to_vec).unwrap_or_default(),
        loaded_at: chrono::Utc::now(),
    };

    log::info!(
        "Model loaded: {} ({}, {} features, sha256 {})",
        metadata.model_name,
        metadata.model_kind,
        metadata.features,
        &metadata.checksum[..12]
    );

    Ok(LoadedModel { classifier, metadata })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    /// Forest over two named features: PHQ9 Score splits high vs. low,
    /// social_support_index splits low vs. medium.
    pub(crate) fn forest_json() -> serde_json::Value {
        serde_json::json!({
            "format_version": 1,
            "name": "ppd-forest-test",
            "feature_names": ["PHQ9 Score", "social_support_index"],
            "classes": ["high", "low", "medium"],
            "model": {
                "kind": "forest",
                "feature_importances": [0.7, 0.3],
                "trees": [{
                    "children_left":  [1, 3, -1, -1, -1],
                    "children_right": [2, 4, -1, -1, -1],
                    "feature":        [0, 1, -2, -2, -2],
                    "threshold":      [9.5, 0.5, -2.0, -2.0, -2.0],
                    "value": [[30, 40, 30], [0, 40, 30], [30, 0, 0], [0, 5, 25], [0, 35, 5]],
                    "n_node_samples": [100, 70, 30, 30, 40]
                }]
            }
        })
    }

    #[test]
    fn test_load_json_forest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, forest_json().to_string()).unwrap();

        let loaded = load_model(&path, None).unwrap();
        assert_eq!(loaded.metadata.model_kind, "random_forest");
        assert_eq!(loaded.metadata.model_name, "ppd-forest-test");
        assert_eq!(loaded.metadata.features, 2);
        assert_eq!(loaded.metadata.checksum.len(), 64);
        assert!(loaded.classifier.tree_ensemble().is_some());

        // PHQ9 12 → high leaf
        assert_eq!(loaded.classifier.predict(&[12.0, 0.9]).unwrap(), 0);
        // PHQ9 3, strong support → low leaf
        assert_eq!(loaded.classifier.predict(&[3.0, 0.9]).unwrap(), 1);
        // PHQ9 3, weak support → medium leaf
        assert_eq!(loaded.classifier.predict(&[3.0, 0.2]).unwrap(), 2);
    }

    #[test]
    fn test_voting_envelope_builds_members() {
        let mut json = forest_json();
        let forest = json["model"].clone();
        json["model"] = serde_json::json!({
            "kind": "voting",
            "members": [
                {"kind": "logistic", "coef": [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]], "intercept": [0.0, 0.0, 0.0]},
                forest
            ]
        });
        let envelope: ArtifactEnvelope = serde_json::from_value(json).unwrap();
        let classifier = envelope.build().unwrap();
        assert_eq!(classifier.kind(), "soft_voting");
        assert!(classifier.tree_ensemble().is_some());
    }

    #[test]
    fn test_missing_file_and_bad_version() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_model(&dir.path().join("absent.json"), None),
            Err(ArtifactError::NotFound(_))
        ));

        let mut json = forest_json();
        json["format_version"] = serde_json::json!(99);
        let envelope: ArtifactEnvelope = serde_json::from_value(json).unwrap();
        assert!(envelope.build().is_err());
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
