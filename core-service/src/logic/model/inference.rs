//! Prediction Service - aligned rows in, risk label out
//!
//! Aligns a feature vector to the classifier's column order, normalizes
//! stray text cells, then asks for a hard label (required) and class
//! probabilities (best effort).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::artifact::ModelMetadata;
use super::classifier::{Classifier, ModelError, RiskLevel};
use crate::constants::{DEFAULT_CLASS_ORDER, MISSING_FEATURE_DEFAULT, NULL_PLACEHOLDER};
use crate::logic::encoding::LabelEncodingTable;
use crate::logic::features::{FeatureValue, FeatureVector};

/// Text cells treated as empty
const NULL_TOKENS: [&str; 4] = ["", "nan", "none", "null"];

/// Tolerance before probabilities are renormalized
const PROBABILITY_TOLERANCE: f64 = 1e-6;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("prediction failed: {0}")]
    Failed(#[from] ModelError),

    #[error("classifier reports unknown class label '{0}'")]
    UnknownClass(String),

    #[error("classifier returned class index {0} outside its label list")]
    ClassIndex(usize),
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A feature vector laid out in the classifier's column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub columns: Vec<String>,
    pub values: Vec<f64>,
    /// Expected columns the input did not carry (padded)
    pub missing: Vec<String>,
    /// Cells normalized to the null placeholder
    pub nulls: usize,
}

/// Prediction output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub risk_level: RiskLevel,
    pub class_index: usize,
    /// `None` when the classifier cannot produce usable probabilities
    pub probabilities: Option<BTreeMap<RiskLevel, f64>>,
    /// Probability of the predicted label
    pub confidence: Option<f64>,
    pub inference_time_us: u64,
}

/// Engine Status for status endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub model_name: String,
    pub model_kind: String,
    pub checksum: String,
    pub feature_count: usize,
    pub labels: Vec<RiskLevel>,
    pub avg_latency_ms: f32,
    pub inference_count: u64,
    pub failure_count: u64,
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
    table: Arc<LabelEncodingTable>,
    /// Label for each classifier output index, resolved once
    labels: Vec<RiskLevel>,
    metadata: Option<ModelMetadata>,

    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
    failure_count: AtomicU64,
}

impl PredictionService {
    /// Resolves the label mapping up front; an unknown label is fatal
    pub fn new(classifier: Arc<dyn Classifier>, table: Arc<LabelEncodingTable>) -> Result<Self, PredictionError> {
        let labels = resolve_labels(classifier.as_ref())?;
        Ok(Self {
            classifier,
            table,
            labels,
            metadata: None,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        })
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    pub fn labels(&self) -> &[RiskLevel] {
        &self.labels
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    /// Reorder to the classifier's columns, pad missing ones, drop extras
    pub fn align(&self, features: &FeatureVector) -> AlignedRow {
        let columns = self.classifier.feature_names().to_vec();
        let mut values = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        let mut nulls = 0;

        for column in &columns {
            let value = match features.get(column) {
                None => {
                    missing.push(column.clone());
                    MISSING_FEATURE_DEFAULT
                }
                Some(FeatureValue::Number(n)) if n.is_finite() => *n,
                Some(FeatureValue::Number(_)) => NULL_PLACEHOLDER,
                Some(FeatureValue::Text(text)) => self.normalize_text(column, text),
            };
            if value.is_nan() {
                nulls += 1;
            }
            values.push(value);
        }

        if !missing.is_empty() {
            log::debug!("Padded {} missing columns: {:?}", missing.len(), missing);
        }

        AlignedRow {
            columns,
            values,
            missing,
            nulls,
        }
    }

    fn normalize_text(&self, column: &str, text: &str) -> f64 {
        let cleaned = text.trim().to_lowercase();
        if NULL_TOKENS.contains(&cleaned.as_str()) {
            return NULL_PLACEHOLDER;
        }
        if let Ok(n) = cleaned.parse::<f64>() {
            if n.is_finite() {
                return n;
            }
        }
        if self.table.contains(column) {
            log::warn!("Encoding residual text in '{}': '{}'", column, cleaned);
            self.table.encode(column, &cleaned) as f64
        } else {
            log::warn!("Unencodable text in '{}' treated as empty", column);
            NULL_PLACEHOLDER
        }
    }

    /// Classify one vector. The label is required; probabilities are not.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, PredictionError> {
        let row = self.align(features);
        self.predict_row(&row.values)
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<PredictionResult, PredictionError> {
        let start = Instant::now();

        let class_index = match self.classifier.predict(row) {
            Ok(index) => index,
            Err(e) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                log::error!("Classifier failed: {}", e);
                return Err(e.into());
            }
        };
        let risk_level = *self
            .labels
            .get(class_index)
            .ok_or(PredictionError::ClassIndex(class_index))?;

        let probabilities = self.probabilities(row);
        let confidence = probabilities.as_ref().and_then(|p| p.get(&risk_level).copied());

        let inference_time_us = start.elapsed().as_micros() as u64;
        self.latency_sum_us.fetch_add(inference_time_us, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(PredictionResult {
            risk_level,
            class_index,
            probabilities,
            confidence,
            inference_time_us,
        })
    }

    fn probabilities(&self, row: &[f64]) -> Option<BTreeMap<RiskLevel, f64>> {
        if !self.classifier.supports_proba() {
            return None;
        }

        let raw = match self.classifier.predict_proba(row) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Probabilities unavailable: {}", e);
                return None;
            }
        };

        if raw.len() != self.labels.len() {
            log::warn!(
                "Probability vector has {} entries for {} labels",
                raw.len(),
                self.labels.len()
            );
            return None;
        }
        if raw.iter().any(|p| !p.is_finite() || *p < 0.0) {
            log::warn!("Probability vector has invalid entries: {:?}", raw);
            return None;
        }

        let sum: f64 = raw.iter().sum();
        if sum <= 0.0 {
            return None;
        }
        let scale = if (sum - 1.0).abs() > PROBABILITY_TOLERANCE { 1.0 / sum } else { 1.0 };

        Some(self.labels.iter().copied().zip(raw.iter().map(|p| p * scale)).collect())
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        let (name, checksum) = match &self.metadata {
            Some(meta) => (meta.model_name.clone(), meta.checksum.clone()),
            None => ("in-memory".to_string(), String::new()),
        };

        EngineStatus {
            model_loaded: true,
            model_name: name,
            model_kind: self.classifier.kind().to_string(),
            checksum,
            feature_count: self.classifier.feature_names().len(),
            labels: self.labels.clone(),
            avg_latency_ms: avg,
            inference_count: count,
            failure_count: self.failure_count.load(Ordering::Relaxed),
        }
    }
}

/// Output index → label, from the classifier's own class list when it has
/// one, the training label order otherwise
pub fn resolve_labels(classifier: &dyn Classifier) -> Result<Vec<RiskLevel>, PredictionError> {
    match classifier.classes() {
        Some(classes) => classes
            .iter()
            .map(|c| c.parse::<RiskLevel>().map_err(|_| PredictionError::UnknownClass(c.clone())))
            .collect(),
        None => Ok(DEFAULT_CLASS_ORDER.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::artifact::{tests::forest_json, ArtifactEnvelope};

    /// Predicts a fixed index; probabilities configurable
    struct FixedClassifier {
        names: Vec<String>,
        classes: Option<Vec<String>>,
        index: Result<usize, ()>,
        proba: Option<Result<Vec<f64>, ()>>,
    }

    impl FixedClassifier {
        fn new(index: usize) -> Self {
            Self {
                names: vec!["a".to_string(), "b".to_string()],
                classes: None,
                index: Ok(index),
                proba: None,
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn kind(&self) -> &str {
            "fixed"
        }
        fn feature_names(&self) -> &[String] {
            &self.names
        }
        fn classes(&self) -> Option<&[String]> {
            self.classes.as_deref()
        }
        fn predict(&self, _row: &[f64]) -> Result<usize, ModelError> {
            self.index.map_err(|_| ModelError::Inference("boom".to_string()))
        }
        fn supports_proba(&self) -> bool {
            self.proba.is_some()
        }
        fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>, ModelError> {
            match &self.proba {
                Some(Ok(p)) => Ok(p.clone()),
                _ => Err(ModelError::Inference("no proba".to_string())),
            }
        }
    }

    fn service(classifier: FixedClassifier) -> PredictionService {
        PredictionService::new(Arc::new(classifier), Arc::new(LabelEncodingTable::training_default())).unwrap()
    }

    fn forest_service() -> PredictionService {
        let envelope: ArtifactEnvelope = serde_json::from_value(forest_json()).unwrap();
        let classifier: Arc<dyn Classifier> = Arc::from(envelope.build().unwrap());
        PredictionService::new(classifier, Arc::new(LabelEncodingTable::training_default())).unwrap()
    }

    #[test]
    fn test_default_label_order_without_classes() {
        // index 0 → high, 1 → low, 2 → medium
        let results: Vec<RiskLevel> = (0..3)
            .map(|i| service(FixedClassifier::new(i)).predict(&FeatureVector::new()).unwrap().risk_level)
            .collect();
        assert_eq!(results, vec![RiskLevel::High, RiskLevel::Low, RiskLevel::Medium]);
    }

    #[test]
    fn test_reported_classes_override_default_order() {
        let mut classifier = FixedClassifier::new(0);
        classifier.classes = Some(vec!["low".to_string(), "medium".to_string(), "high".to_string()]);
        let result = service(classifier).predict(&FeatureVector::new()).unwrap();
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_unknown_class_label_is_rejected_at_startup() {
        let mut classifier = FixedClassifier::new(0);
        classifier.classes = Some(vec!["low".to_string(), "catastrophic".to_string()]);
        let result = PredictionService::new(Arc::new(classifier), Arc::new(LabelEncodingTable::empty()));
        assert!(matches!(result, Err(PredictionError::UnknownClass(_))));
    }

    #[test]
    fn test_align_pads_drops_and_normalizes() {
        let svc = service(FixedClassifier::new(0));
        let features = FeatureVector::from_entries([
            ("b", FeatureValue::from("NaN")),
            ("extra", FeatureValue::from(7.0)),
        ]);
        let row = svc.align(&features);
        assert_eq!(row.columns, vec!["a", "b"]);
        assert_eq!(row.values[0], MISSING_FEATURE_DEFAULT);
        assert!(row.values[1].is_nan());
        assert_eq!(row.missing, vec!["a"]);
        assert_eq!(row.nulls, 1);
    }

    #[test]
    fn test_text_cells_parse_or_encode() {
        let svc = forest_service();
        let features = FeatureVector::from_entries([
            ("PHQ9 Score", FeatureValue::from(" 12 ")),
            ("social_support_index", FeatureValue::from("none")),
        ]);
        let row = svc.align(&features);
        assert_eq!(row.values[0], 12.0);
        assert!(row.values[1].is_nan());

        // A categorical column encodes through the table
        let mut classifier = FixedClassifier::new(0);
        classifier.names = vec!["Abuse".to_string()];
        let row = service(classifier).align(&FeatureVector::from_entries([("Abuse", "Yes")]));
        assert_eq!(row.values, vec![2.0]);
    }

    #[test]
    fn test_probabilities_are_keyed_and_normalized() {
        let svc = forest_service();
        let features = FeatureVector::from_entries([("PHQ9 Score", 3.0), ("social_support_index", 0.2)]);
        let result = svc.predict(&features).unwrap();
        assert_eq!(result.risk_level, RiskLevel::Medium);

        let p = result.probabilities.unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(result.confidence, p.get(&RiskLevel::Medium).copied());

        let mut classifier = FixedClassifier::new(1);
        classifier.proba = Some(Ok(vec![2.0, 6.0, 2.0]));
        let p = service(classifier).predict(&FeatureVector::new()).unwrap().probabilities.unwrap();
        assert!((p[&RiskLevel::Low] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_probability_failure_is_not_fatal() {
        let mut classifier = FixedClassifier::new(2);
        classifier.proba = Some(Err(()));
        let result = service(classifier).predict(&FeatureVector::new()).unwrap();
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert!(result.probabilities.is_none());

        let mut classifier = FixedClassifier::new(2);
        classifier.proba = Some(Ok(vec![0.5, 0.5]));
        assert!(service(classifier).predict(&FeatureVector::new()).unwrap().probabilities.is_none());
    }

    #[test]
    fn test_hard_prediction_failure_is_fatal() {
        let mut classifier = FixedClassifier::new(0);
        classifier.index = Err(());
        let svc = service(classifier);
        assert!(matches!(svc.predict(&FeatureVector::new()), Err(PredictionError::Failed(_))));
        assert_eq!(svc.status().failure_count, 1);

        let out_of_range = service(FixedClassifier::new(9));
        assert!(matches!(
            out_of_range.predict(&FeatureVector::new()),
            Err(PredictionError::ClassIndex(9))
        ));
    }

    #[test]
    fn test_status_counts_inferences() {
        let svc = service(FixedClassifier::new(0));
        svc.predict(&FeatureVector::new()).unwrap();
        svc.predict(&FeatureVector::new()).unwrap();
        let status = svc.status();
        assert_eq!(status.inference_count, 2);
        assert_eq!(status.model_kind, "fixed");
    }
}
