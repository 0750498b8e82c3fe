//! Model-agnostic attribution by permutation sampling
//!
//! Each permutation walks from a background row to the instance, switching
//! one feature at a time; the change in the target-class probability at
//! each switch is that feature's marginal contribution. Averaged over
//! permutations this estimates the Shapley value.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::engine::{AttributionMethod, ExplainError, RawAttribution};
use super::types::AttributionStrategy;
use crate::constants::{MISSING_FEATURE_DEFAULT, NULL_PLACEHOLDER, ZERO_BACKGROUND_ROWS};
use crate::logic::model::Classifier;

// ============================================================================
// BACKGROUND
// ============================================================================

/// Reference rows in the classifier's column order
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    rows: Vec<Vec<f64>>,
    source: String,
}

impl Background {
    /// Synthetic all-zero baseline
    pub fn zeros(width: usize) -> Self {
        Self {
            rows: vec![vec![0.0; width]; ZERO_BACKGROUND_ROWS],
            source: "zeros".to_string(),
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ExplainError> {
        if rows.is_empty() {
            return Err(ExplainError::Background("no background rows".to_string()));
        }
        Ok(Self {
            rows,
            source: "memory".to_string(),
        })
    }

    /// Training rows from CSV, matched to `columns` by header name.
    ///
    /// Columns absent from the file take the missing-feature default, empty
    /// cells become the null placeholder, and rows with any other
    /// unparsable cell are dropped. At most `max_rows` are kept, sampled
    /// deterministically from `seed`.
    pub fn from_csv(path: &Path, columns: &[String], max_rows: usize, seed: u64) -> Result<Self, ExplainError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| ExplainError::Background(format!("{}: {}", path.display(), e)))?;

        let headers = reader
            .headers()
            .map_err(|e| ExplainError::Background(e.to_string()))?
            .clone();
        let positions: Vec<Option<usize>> = columns
            .iter()
            .map(|c| headers.iter().position(|h| h.trim() == c))
            .collect();

        let absent = positions.iter().filter(|p| p.is_none()).count();
        if absent > 0 {
            log::warn!("Background data lacks {} of {} model columns", absent, columns.len());
        }

        let mut rows = Vec::new();
        let mut dropped = 0usize;
        for record in reader.records() {
            let record = record.map_err(|e| ExplainError::Background(e.to_string()))?;
            match parse_row(&record, &positions) {
                Some(row) => rows.push(row),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::warn!("Dropped {} background rows with unparsable cells", dropped);
        }
        if rows.is_empty() {
            return Err(ExplainError::Background(format!("{}: no usable rows", path.display())));
        }

        if rows.len() > max_rows {
            let mut rng = StdRng::seed_from_u64(seed);
            rows = rows.choose_multiple(&mut rng, max_rows).cloned().collect();
        }

        log::info!("Background data: {} rows from {}", rows.len(), path.display());
        Ok(Self {
            rows,
            source: path.display().to_string(),
        })
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

fn parse_row(record: &csv::StringRecord, positions: &[Option<usize>]) -> Option<Vec<f64>> {
    positions
        .iter()
        .map(|pos| match pos {
            None => Some(MISSING_FEATURE_DEFAULT),
            Some(i) => {
                let cell = record.get(*i)?.trim();
                if cell.is_empty() {
                    Some(NULL_PLACEHOLDER)
                } else {
                    cell.parse::<f64>().ok()
                }
            }
        })
        .collect()
}

// ============================================================================
// METHOD
// ============================================================================

pub struct SamplingMethod {
    classifier: Arc<dyn Classifier>,
    background: Background,
    /// Mean background probability per class
    base: Vec<f64>,
    permutations: usize,
    seed: u64,
    budget: Duration,
}

impl SamplingMethod {
    /// Precomputes the background outputs; fails if the classifier cannot
    /// score them
    pub fn new(
        classifier: Arc<dyn Classifier>,
        background: Background,
        permutations: usize,
        seed: u64,
        budget: Duration,
    ) -> Result<Self, ExplainError> {
        let width = classifier.feature_names().len();
        if background.is_empty() {
            return Err(ExplainError::Background("no background rows".to_string()));
        }
        if let Some(row) = background.rows().iter().find(|r| r.len() != width) {
            return Err(ExplainError::ShapeMismatch {
                expected: width,
                actual: row.len(),
            });
        }

        let mut base: Vec<f64> = Vec::new();
        for row in background.rows() {
            let proba = classifier.predict_proba(row)?;
            if base.is_empty() {
                base = vec![0.0; proba.len()];
            }
            for (b, p) in base.iter_mut().zip(&proba) {
                *b += p;
            }
        }
        let n = background.len() as f64;
        base.iter_mut().for_each(|b| *b /= n);

        Ok(Self {
            classifier,
            background,
            base,
            permutations: permutations.max(1),
            seed,
            budget,
        })
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    fn target_output(&self, row: &[f64], target: usize) -> Result<f64, ExplainError> {
        let proba = self.classifier.predict_proba(row)?;
        proba.get(target).copied().ok_or(ExplainError::InvalidTarget(target))
    }
}

impl AttributionMethod for SamplingMethod {
    fn strategy(&self) -> AttributionStrategy {
        AttributionStrategy::Sampling
    }

    fn attribute(&self, row: &[f64], target: usize) -> Result<RawAttribution, ExplainError> {
        let width = self.classifier.feature_names().len();
        if row.len() != width {
            return Err(ExplainError::ShapeMismatch {
                expected: width,
                actual: row.len(),
            });
        }
        let base = *self.base.get(target).ok_or(ExplainError::InvalidTarget(target))?;

        let start = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..width).collect();
        let mut phi = vec![0.0; width];

        for p in 0..self.permutations {
            order.shuffle(&mut rng);
            let mut current = self.background.rows()[p % self.background.len()].clone();
            let mut previous = self.target_output(&current, target)?;

            for &feature in &order {
                current[feature] = row[feature];
                let next = self.target_output(&current, target)?;
                phi[feature] += next - previous;
                previous = next;
            }

            if start.elapsed() > self.budget {
                return Err(ExplainError::DeadlineExceeded(self.budget));
            }
        }

        let n = self.permutations as f64;
        phi.iter_mut().for_each(|v| *v /= n);

        Ok(RawAttribution {
            base_value: Some(base),
            contributions: phi,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::linear::{LogisticArrays, LogisticClassifier};
    use std::fs;
    use tempfile::tempdir;

    fn logistic() -> Arc<dyn Classifier> {
        let arrays = LogisticArrays {
            coef: vec![vec![1.0, -0.5, 0.0], vec![-1.0, 0.5, 0.0]],
            intercept: vec![0.0, 0.0],
            mean: None,
            scale: None,
        };
        Arc::new(
            LogisticClassifier::new(
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec!["high".to_string(), "low".to_string()],
                arrays,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_single_background_row_is_additive() {
        let classifier = logistic();
        let background = Background::from_rows(vec![vec![0.0, 0.0, 0.0]]).unwrap();
        let method = SamplingMethod::new(Arc::clone(&classifier), background, 16, 42, Duration::from_secs(5)).unwrap();

        let row = [1.5, -2.0, 3.0];
        let raw = method.attribute(&row, 0).unwrap();
        let prediction = classifier.predict_proba(&row).unwrap()[0];
        let total: f64 = raw.contributions.iter().sum::<f64>() + raw.base_value.unwrap();
        assert!((total - prediction).abs() < 1e-9);

        // Feature with zero weight contributes nothing
        assert!(raw.contributions[2].abs() < 1e-12);
        assert!(raw.contributions[0] > 0.0);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let background = Background::zeros(3);
        let method = SamplingMethod::new(logistic(), background, 8, 7, Duration::from_secs(5)).unwrap();
        let first = method.attribute(&[1.0, 1.0, 1.0], 0).unwrap();
        let second = method.attribute(&[1.0, 1.0, 1.0], 0).unwrap();
        assert_eq!(first.contributions, second.contributions);
    }

    #[test]
    fn test_exhausted_budget_fails() {
        let method = SamplingMethod::new(logistic(), Background::zeros(3), 64, 42, Duration::ZERO).unwrap();
        assert!(matches!(
            method.attribute(&[1.0, 1.0, 1.0], 0),
            Err(ExplainError::DeadlineExceeded(_))
        ));
    }

    #[test]
    fn test_background_width_must_match() {
        let background = Background::from_rows(vec![vec![0.0; 2]]).unwrap();
        assert!(SamplingMethod::new(logistic(), background, 4, 42, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_csv_background_matches_columns_by_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("background.csv");
        fs::write(&path, "c,a,extra\n1,2,x\n3,,y\nbad,4,z\n5,6,w\n").unwrap();

        let columns = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let background = Background::from_csv(&path, &columns, 100, 42).unwrap();
        assert_eq!(background.len(), 3);
        assert_eq!(background.rows()[0], vec![2.0, 0.0, 1.0]);
        assert!(background.rows()[1][0].is_nan());

        let sampled = Background::from_csv(&path, &columns, 2, 42).unwrap();
        assert_eq!(sampled.len(), 2);
        let again = Background::from_csv(&path, &columns, 2, 42).unwrap();
        assert_eq!(format!("{:?}", sampled.rows()), format!("{:?}", again.rows()));
    }

    #[test]
    fn test_csv_without_usable_rows_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("background.csv");
        fs::write(&path, "a\nnope\n").unwrap();
        assert!(Background::from_csv(&path, &["a".to_string()], 10, 42).is_err());
        assert!(Background::from_csv(&dir.path().join("absent.csv"), &["a".to_string()], 10, 42).is_err());
    }
}
