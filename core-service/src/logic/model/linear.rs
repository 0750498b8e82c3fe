//! Multinomial logistic regression

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactError;
use super::classifier::{argmax, check_width, Classifier, ModelError};

/// Coefficients as exported by the training pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArrays {
    /// `[n_classes][n_features]`; a single row means a binary model
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    /// Optional standardization applied before the linear layer
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    feature_names: Vec<String>,
    classes: Vec<String>,
    arrays: LogisticArrays,
}

impl LogisticClassifier {
    pub fn new(feature_names: Vec<String>, classes: Vec<String>, arrays: LogisticArrays) -> Result<Self, ArtifactError> {
        let n_features = feature_names.len();
        let rows = arrays.coef.len();

        let binary = rows == 1 && classes.len() == 2;
        if !binary && rows != classes.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} coefficient rows for {} classes",
                rows,
                classes.len()
            )));
        }
        if arrays.intercept.len() != rows {
            return Err(ArtifactError::Invalid("intercept count mismatch".to_string()));
        }
        if arrays.coef.iter().any(|row| row.len() != n_features) {
            return Err(ArtifactError::Invalid("coefficient width mismatch".to_string()));
        }
        for stats in [&arrays.mean, &arrays.scale].into_iter().flatten() {
            if stats.len() != n_features {
                return Err(ArtifactError::Invalid("standardization width mismatch".to_string()));
            }
        }

        Ok(Self {
            feature_names,
            classes,
            arrays,
        })
    }

    /// Standardized input; NaN cells take the training mean (0 after scaling)
    fn prepare(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(i, &x)| {
                if x.is_nan() {
                    return 0.0;
                }
                let mean = self.arrays.mean.as_ref().map_or(0.0, |m| m[i]);
                let scale = self.arrays.scale.as_ref().map_or(1.0, |s| s[i]);
                if scale == 0.0 {
                    0.0
                } else {
                    (x - mean) / scale
                }
            })
            .collect()
    }

    fn decision(&self, x: &[f64]) -> Vec<f64> {
        self.arrays
            .coef
            .iter()
            .zip(&self.arrays.intercept)
            .map(|(w, b)| w.iter().zip(x).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.iter().map(|e| e / sum).collect()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticClassifier {
    fn kind(&self) -> &str {
        "logistic_regression"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn classes(&self) -> Option<&[String]> {
        Some(&self.classes)
    }

    fn predict(&self, row: &[f64]) -> Result<usize, ModelError> {
        let proba = self.predict_proba(row)?;
        argmax(&proba).ok_or_else(|| ModelError::Inference("empty probability vector".to_string()))
    }

    fn supports_proba(&self) -> bool {
        true
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.feature_names.len(), row)?;
        let z = self.decision(&self.prepare(row));
        let proba = if z.len() == 1 {
            let p = sigmoid(z[0]);
            vec![1.0 - p, p]
        } else {
            softmax(&z)
        };
        Ok(proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LogisticClassifier {
        LogisticClassifier::new(
            vec!["a".to_string(), "b".to_string()],
            vec!["high".to_string(), "low".to_string(), "medium".to_string()],
            LogisticArrays {
                coef: vec![vec![2.0, 0.0], vec![-2.0, 0.0], vec![0.0, 1.0]],
                intercept: vec![0.0, 0.0, 0.0],
                mean: Some(vec![1.0, 0.0]),
                scale: Some(vec![2.0, 1.0]),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let p = model().predict_proba(&[3.0, 0.5]).unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(model().predict(&[3.0, 0.5]).unwrap(), 0);
        assert_eq!(model().predict(&[-3.0, 0.0]).unwrap(), 1);
    }

    #[test]
    fn test_nan_imputes_mean() {
        let m = model();
        assert_eq!(m.predict_proba(&[f64::NAN, 0.0]).unwrap(), m.predict_proba(&[1.0, 0.0]).unwrap());
    }

    #[test]
    fn test_binary_model_uses_sigmoid() {
        let m = LogisticClassifier::new(
            vec!["a".to_string()],
            vec!["low".to_string(), "high".to_string()],
            LogisticArrays {
                coef: vec![vec![1.0]],
                intercept: vec![0.0],
                mean: None,
                scale: None,
            },
        )
        .unwrap();
        let p = m.predict_proba(&[0.0]).unwrap();
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn test_shape_validation() {
        let bad = LogisticClassifier::new(
            vec!["a".to_string()],
            vec!["low".to_string(), "medium".to_string(), "high".to_string()],
            LogisticArrays {
                coef: vec![vec![1.0]],
                intercept: vec![0.0],
                mean: None,
                scale: None,
            },
        );
        assert!(bad.is_err());
    }
}
