//! ONNX Runtime classifier
//!
//! For models exported with skl2onnx (`zipmap=False`): one float input of
//! shape `[1, n_features]`, a label output and a probability output of
//! shape `[1, n_classes]`. The predicted class is the arg-max of the
//! probability output, so string label tensors are never decoded.

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::artifact::ArtifactError;
use super::classifier::{argmax, check_width, Classifier, ModelError};

/// Sidecar describing what the graph itself cannot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnnxSchema {
    #[serde(default)]
    pub name: Option<String>,
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

impl OnnxSchema {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let schema: OnnxSchema = serde_json::from_str(&content)?;

        if schema.feature_names.is_empty() || schema.classes.is_empty() {
            return Err(ArtifactError::Invalid("schema lists no features or classes".to_string()));
        }
        if let Some(importances) = &schema.feature_importances {
            if importances.len() != schema.feature_names.len() {
                return Err(ArtifactError::Invalid("importance count mismatch".to_string()));
            }
        }
        Ok(schema)
    }
}

pub struct OnnxClassifier {
    schema: OnnxSchema,
    /// `run` needs exclusive access to the session
    session: Mutex<Session>,
    label_output: String,
    probability_output: Option<String>,
}

impl OnnxClassifier {
    pub fn load(path: &Path, schema: OnnxSchema) -> Result<Self, ArtifactError> {
        let session = Session::builder()
            .map_err(|e| ArtifactError::Onnx(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ArtifactError::Onnx(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| ArtifactError::Onnx(format!("Failed to load model: {}", e)))?;

        let outputs: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let label_output = outputs
            .iter()
            .find(|n| n.contains("label"))
            .or_else(|| outputs.first())
            .cloned()
            .ok_or_else(|| ArtifactError::Onnx("model has no outputs".to_string()))?;
        let probability_output = outputs
            .iter()
            .find(|n| n.contains("prob"))
            .or_else(|| outputs.iter().find(|n| **n != label_output))
            .cloned();

        log::info!(
            "ONNX outputs: label='{}', probability={:?}",
            label_output,
            probability_output
        );

        Ok(Self {
            schema,
            session: Mutex::new(session),
            label_output,
            probability_output,
        })
    }

    fn input_array(&self, row: &[f64]) -> Result<Array2<f32>, ModelError> {
        check_width(self.schema.feature_names.len(), row)?;
        // Empty cells reach the graph as NaN, which sklearn exports accept
        let data: Vec<f32> = row.iter().map(|&x| x as f32).collect();
        Array2::from_shape_vec((1, row.len()), data)
            .map_err(|e| ModelError::Inference(format!("Failed to shape input: {}", e)))
    }
}

impl Classifier for OnnxClassifier {
    fn kind(&self) -> &str {
        "onnx"
    }

    fn feature_names(&self) -> &[String] {
        &self.schema.feature_names
    }

    fn classes(&self) -> Option<&[String]> {
        Some(&self.schema.classes)
    }

    fn predict(&self, row: &[f64]) -> Result<usize, ModelError> {
        if self.probability_output.is_some() {
            let proba = self.predict_proba(row)?;
            return argmax(&proba).ok_or_else(|| ModelError::Inference("empty probability output".to_string()));
        }

        let input_tensor = Value::from_array(self.input_array(row)?)
            .map_err(|e| ModelError::Inference(format!("Failed to create tensor: {}", e)))?;
        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Inference(format!("Inference failed: {}", e)))?;
        let output = outputs
            .get(self.label_output.as_str())
            .ok_or_else(|| ModelError::Inference("No label output".to_string()))?;
        let (_, labels) = output
            .try_extract_tensor::<i64>()
            .map_err(|e| ModelError::Inference(format!("Failed to extract labels: {}", e)))?;

        labels
            .first()
            .and_then(|&l| usize::try_from(l).ok())
            .ok_or_else(|| ModelError::Inference("Invalid label output".to_string()))
    }

    fn supports_proba(&self) -> bool {
        self.probability_output.is_some()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let name = self
            .probability_output
            .as_deref()
            .ok_or(ModelError::Unsupported("predict_proba"))?;

        let input_tensor = Value::from_array(self.input_array(row)?)
            .map_err(|e| ModelError::Inference(format!("Failed to create tensor: {}", e)))?;
        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Inference(format!("Inference failed: {}", e)))?;
        let output = outputs
            .get(name)
            .ok_or_else(|| ModelError::Inference("No probability output".to_string()))?;
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("Failed to extract probabilities: {}", e)))?;

        Ok(data.iter().map(|&p| p as f64).collect())
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        self.schema.feature_importances.as_deref()
    }
}
