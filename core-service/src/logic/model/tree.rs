//! Decision tree ensembles (random forest / extra trees / single tree)
//!
//! Trees are stored as scikit-learn style parallel arrays: `-1` children
//! mark leaves, rows go left when `x[feature] <= threshold`. Leaf values are
//! class distributions, normalized at load.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactError;
use super::classifier::{argmax, check_width, Classifier, ModelError};

// ============================================================================
// ARTIFACT ARRAYS
// ============================================================================

/// One tree as exported by the training pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per node class counts or fractions, `[n_nodes][n_classes]`
    pub value: Vec<Vec<f64>>,
    /// Training samples reaching each node
    pub n_node_samples: Vec<f64>,
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub feature: usize,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub split: Option<Split>,
    /// Training samples reaching this node (> 0)
    pub cover: f64,
    /// Class distribution (sums to 1 at leaves)
    pub value: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn from_arrays(arrays: &TreeArrays, n_features: usize, n_classes: usize) -> Result<Self, ArtifactError> {
        let n = arrays.children_left.len();
        if n == 0 {
            return Err(ArtifactError::Invalid("tree without nodes".to_string()));
        }
        let lengths = [
            arrays.children_right.len(),
            arrays.feature.len(),
            arrays.threshold.len(),
            arrays.value.len(),
            arrays.n_node_samples.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(ArtifactError::Invalid("tree arrays differ in length".to_string()));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let cover = arrays.n_node_samples[i];
            if !(cover > 0.0) {
                return Err(ArtifactError::Invalid(format!("node {} has no samples", i)));
            }
            if arrays.value[i].len() != n_classes {
                return Err(ArtifactError::Invalid(format!(
                    "node {} has {} class values, expected {}",
                    i,
                    arrays.value[i].len(),
                    n_classes
                )));
            }

            let split = match (arrays.children_left[i], arrays.children_right[i]) {
                (-1, -1) => None,
                (l, r) if l > i as i64 && r > i as i64 && (l as usize) < n && (r as usize) < n => {
                    let feature = arrays.feature[i];
                    if feature < 0 || feature as usize >= n_features {
                        return Err(ArtifactError::Invalid(format!(
                            "node {} splits on unknown feature {}",
                            i, feature
                        )));
                    }
                    let threshold = arrays.threshold[i];
                    if !threshold.is_finite() {
                        return Err(ArtifactError::Invalid(format!("node {} has no threshold", i)));
                    }
                    Some(Split {
                        feature: feature as usize,
                        threshold,
                        left: l as usize,
                        right: r as usize,
                    })
                }
                (l, r) => {
                    return Err(ArtifactError::Invalid(format!(
                        "node {} has invalid children ({}, {})",
                        i, l, r
                    )))
                }
            };

            let value = normalize(&arrays.value[i]);
            if split.is_none() && value.is_none() {
                return Err(ArtifactError::Invalid(format!("leaf {} has an empty distribution", i)));
            }

            nodes.push(Node {
                split,
                cover,
                value: value.unwrap_or_else(|| vec![0.0; n_classes]),
            });
        }

        Ok(Self { nodes })
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child a row follows at `split`. NaN goes to the better-populated child.
    pub fn hot_child(&self, split: &Split, row: &[f64]) -> usize {
        let x = row[split.feature];
        if x.is_nan() {
            if self.nodes[split.left].cover >= self.nodes[split.right].cover {
                split.left
            } else {
                split.right
            }
        } else if x <= split.threshold {
            split.left
        } else {
            split.right
        }
    }

    /// Class distribution of the leaf `row` lands in
    pub fn leaf_value(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        while let Some(split) = &self.nodes[index].split {
            index = self.hot_child(split, row);
        }
        &self.nodes[index].value
    }

    /// Cover-weighted mean leaf value (the tree's output with no information)
    pub fn expected_value(&self) -> Vec<f64> {
        self.expected_from(0)
    }

    fn expected_from(&self, index: usize) -> Vec<f64> {
        let node = &self.nodes[index];
        match &node.split {
            None => node.value.clone(),
            Some(split) => {
                let left = &self.nodes[split.left];
                let right = &self.nodes[split.right];
                let total = left.cover + right.cover;
                let l = self.expected_from(split.left);
                let r = self.expected_from(split.right);
                l.iter()
                    .zip(&r)
                    .map(|(a, b)| (a * left.cover + b * right.cover) / total)
                    .collect()
            }
        }
    }
}

fn normalize(values: &[f64]) -> Option<Vec<f64>> {
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }
    let sum: f64 = values.iter().sum();
    (sum > 0.0).then(|| values.iter().map(|v| v / sum).collect())
}

// ============================================================================
// ENSEMBLE
// ============================================================================

/// Trees whose leaf distributions are averaged
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl TreeEnsemble {
    pub fn new(trees: Vec<DecisionTree>, n_features: usize, n_classes: usize) -> Result<Self, ArtifactError> {
        if trees.is_empty() {
            return Err(ArtifactError::Invalid("ensemble without trees".to_string()));
        }
        Ok(Self { trees, n_features, n_classes })
    }

    pub fn from_arrays(arrays: &[TreeArrays], n_features: usize, n_classes: usize) -> Result<Self, ArtifactError> {
        let trees = arrays
            .iter()
            .map(|a| DecisionTree::from_arrays(a, n_features, n_classes))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(trees, n_features, n_classes)
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (p, v) in proba.iter_mut().zip(tree.leaf_value(row)) {
                *p += v;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }

    pub fn expected_value(&self) -> Vec<f64> {
        let mut expected = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (e, v) in expected.iter_mut().zip(tree.expected_value()) {
                *e += v;
            }
        }
        let n = self.trees.len() as f64;
        expected.iter_mut().for_each(|e| *e /= n);
        expected
    }
}

// ============================================================================
// FOREST CLASSIFIER
// ============================================================================

#[derive(Debug, Clone)]
pub struct ForestClassifier {
    feature_names: Vec<String>,
    classes: Vec<String>,
    ensemble: Arc<TreeEnsemble>,
    importances: Option<Vec<f64>>,
}

impl ForestClassifier {
    pub fn new(
        feature_names: Vec<String>,
        classes: Vec<String>,
        ensemble: TreeEnsemble,
        importances: Option<Vec<f64>>,
    ) -> Result<Self, ArtifactError> {
        if ensemble.n_features() != feature_names.len() {
            return Err(ArtifactError::Invalid("forest feature count mismatch".to_string()));
        }
        if ensemble.n_classes() != classes.len() {
            return Err(ArtifactError::Invalid("forest class count mismatch".to_string()));
        }
        if let Some(importances) = &importances {
            if importances.len() != feature_names.len() {
                return Err(ArtifactError::Invalid("importance count mismatch".to_string()));
            }
        }

        Ok(Self {
            feature_names,
            classes,
            ensemble: Arc::new(ensemble),
            importances,
        })
    }
}

impl Classifier for ForestClassifier {
    fn kind(&self) -> &str {
        "random_forest"
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
        Ok(self.ensemble.predict_proba(row))
    }

    fn tree_ensemble(&self) -> Option<Arc<TreeEnsemble>> {
        Some(Arc::clone(&self.ensemble))
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        self.importances.as_deref()
    }
}
