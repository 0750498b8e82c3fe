//! Exact path-dependent Shapley values over decision trees
//!
//! Polynomial-time algorithm of Lundberg et al. ("Consistent Individualized
//! Feature Attribution for Tree Ensembles"): one pass per tree tracks, along
//! the current root-to-node path, the share of all feature subsets that
//! reach the node. Output for one class; summed with the ensemble's
//! expected value it reproduces that class's predicted probability.

use std::sync::Arc;

use super::engine::{AttributionMethod, ExplainError, RawAttribution};
use super::types::AttributionStrategy;
use crate::logic::model::{DecisionTree, TreeEnsemble};

#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// `None` for the root sentinel
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

impl PathElement {
    const EMPTY: PathElement = PathElement {
        feature: None,
        zero_fraction: 0.0,
        one_fraction: 0.0,
        weight: 0.0,
    };
}

fn extend_path(path: &mut [PathElement], depth: usize, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    path[depth] = PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    };
    let d = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / d;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / d;
    }
}

/// Undo the extension made at `index`
fn unwind_path(path: &mut [PathElement], depth: usize, index: usize) {
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let d = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * d / ((i + 1) as f64 * one);
            next_one_portion = tmp - path[i].weight * zero * (depth - i) as f64 / d;
        } else {
            path[i].weight = path[i].weight * d / (zero * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
}

/// Total weight the path would have with the element at `index` removed
fn unwound_path_sum(path: &[PathElement], depth: usize, index: usize) -> f64 {
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let d = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = next_one_portion * d / ((i + 1) as f64 * one);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero * (depth - i) as f64 / d;
        } else if zero != 0.0 {
            total += path[i].weight / zero / ((depth - i) as f64 / d);
        }
    }
    total
}

struct TreeWalk<'a> {
    tree: &'a DecisionTree,
    row: &'a [f64],
    class: usize,
    phi: &'a mut [f64],
}

impl TreeWalk<'_> {
    fn recurse(
        &mut self,
        node_index: usize,
        parent_path: &[PathElement],
        depth: usize,
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) {
        let mut path = parent_path[..depth].to_vec();
        path.push(PathElement::EMPTY);
        extend_path(&mut path, depth, zero_fraction, one_fraction, feature);

        let tree = self.tree;
        let node = tree.node(node_index);
        let split = match &node.split {
            None => {
                let leaf = node.value[self.class];
                for i in 1..=depth {
                    let w = unwound_path_sum(&path, depth, i);
                    let el = path[i];
                    if let Some(f) = el.feature {
                        self.phi[f] += w * (el.one_fraction - el.zero_fraction) * leaf;
                    }
                }
                return;
            }
            Some(split) => split,
        };

        let hot = tree.hot_child(split, self.row);
        let cold = if hot == split.left { split.right } else { split.left };
        let hot_zero = tree.node(hot).cover / node.cover;
        let cold_zero = tree.node(cold).cover / node.cover;

        let mut incoming_zero = 1.0;
        let mut incoming_one = 1.0;
        let mut depth = depth;

        // A feature split on twice only counts once on the path
        if let Some(k) = (1..=depth).find(|&k| path[k].feature == Some(split.feature)) {
            incoming_zero = path[k].zero_fraction;
            incoming_one = path[k].one_fraction;
            unwind_path(&mut path, depth, k);
            depth -= 1;
        }

        self.recurse(hot, &path, depth + 1, hot_zero * incoming_zero, incoming_one, Some(split.feature));
        self.recurse(cold, &path, depth + 1, cold_zero * incoming_zero, 0.0, Some(split.feature));
    }
}

/// Per-feature contributions of `row` to one tree's `class` output
pub fn tree_shap(tree: &DecisionTree, row: &[f64], class: usize, phi: &mut [f64]) {
    if tree.is_empty() {
        return;
    }
    let mut walk = TreeWalk { tree, row, class, phi };
    walk.recurse(0, &[], 0, 1.0, 1.0, None);
}

/// Contributions averaged across the ensemble, like its probabilities
pub fn ensemble_shap(ensemble: &TreeEnsemble, row: &[f64], class: usize) -> Vec<f64> {
    let mut phi = vec![0.0; ensemble.n_features()];
    for tree in ensemble.trees() {
        tree_shap(tree, row, class, &mut phi);
    }
    let n = ensemble.trees().len() as f64;
    phi.iter_mut().for_each(|p| *p /= n);
    phi
}

// ============================================================================
// METHOD
// ============================================================================

pub struct TreeExactMethod {
    ensemble: Arc<TreeEnsemble>,
    expected: Vec<f64>,
}

impl TreeExactMethod {
    pub fn new(ensemble: Arc<TreeEnsemble>) -> Self {
        let expected = ensemble.expected_value();
        Self { ensemble, expected }
    }
}

impl AttributionMethod for TreeExactMethod {
    fn strategy(&self) -> AttributionStrategy {
        AttributionStrategy::TreeExact
    }

    fn attribute(&self, row: &[f64], target: usize) -> Result<RawAttribution, ExplainError> {
        if row.len() != self.ensemble.n_features() {
            return Err(ExplainError::ShapeMismatch {
                expected: self.ensemble.n_features(),
                actual: row.len(),
            });
        }
        let base = *self.expected.get(target).ok_or(ExplainError::InvalidTarget(target))?;
        Ok(RawAttribution {
            base_value: Some(base),
            contributions: ensemble_shap(&self.ensemble, row, target),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::tree::tests::stump;
    use crate::logic::model::tree::TreeArrays;

    fn assert_additive(ensemble: &TreeEnsemble, row: &[f64]) {
        let proba = ensemble.predict_proba(row);
        let expected = ensemble.expected_value();
        for class in 0..ensemble.n_classes() {
            let phi = ensemble_shap(ensemble, row, class);
            let total: f64 = phi.iter().sum::<f64>() + expected[class];
            assert!(
                (total - proba[class]).abs() < 1e-9,
                "class {}: {} vs {}",
                class,
                total,
                proba[class]
            );
        }
    }

    /// x0 <= 0.5 → (x1 <= 0.5 → a, else x0 <= 0.2 → b, else c), else d
    fn repeated_feature_tree() -> TreeArrays {
        TreeArrays {
            children_left: vec![1, 3, -1, -1, 5, -1, -1],
            children_right: vec![2, 4, -1, -1, 6, -1, -1],
            feature: vec![0, 1, -2, -2, 0, -2, -2],
            threshold: vec![0.5, 0.5, -2.0, -2.0, 0.2, -2.0, -2.0],
            value: vec![
                vec![10.0, 10.0],
                vec![6.0, 6.0],
                vec![1.0, 7.0],
                vec![4.0, 0.0],
                vec![2.0, 6.0],
                vec![0.0, 3.0],
                vec![2.0, 3.0],
            ],
            n_node_samples: vec![20.0, 12.0, 8.0, 4.0, 8.0, 3.0, 5.0],
        }
    }

    #[test]
    fn test_stump_attribution() {
        let ensemble = TreeEnsemble::from_arrays(&[stump()], 1, 2).unwrap();
        let phi = ensemble_shap(&ensemble, &[0.9], 1);
        assert!((phi[0] - 0.4).abs() < 1e-12);
        let phi = ensemble_shap(&ensemble, &[0.9], 0);
        assert!((phi[0] + 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_additivity_with_repeated_splits() {
        let ensemble = TreeEnsemble::from_arrays(&[repeated_feature_tree(), stump_two_features()], 2, 2).unwrap();
        for row in [[0.1, 0.9], [0.3, 0.9], [0.9, 0.1], [0.1, 0.1], [f64::NAN, 0.9]] {
            assert_additive(&ensemble, &row);
        }
    }

    fn stump_two_features() -> TreeArrays {
        let mut arrays = stump();
        arrays.feature = vec![1, -2, -2];
        arrays
    }

    #[test]
    fn test_unused_feature_gets_nothing() {
        let ensemble = TreeEnsemble::from_arrays(&[stump()], 1, 2).unwrap();
        let wide = TreeEnsemble::new(ensemble.trees().to_vec(), 3, 2).unwrap();
        let phi = ensemble_shap(&wide, &[0.9, 5.0, -5.0], 1);
        assert_eq!(phi[1], 0.0);
        assert_eq!(phi[2], 0.0);
    }

    #[test]
    fn test_method_reports_base_value() {
        let ensemble = Arc::new(TreeEnsemble::from_arrays(&[stump()], 1, 2).unwrap());
        let method = TreeExactMethod::new(ensemble);
        let raw = method.attribute(&[0.2], 1).unwrap();
        assert!((raw.base_value.unwrap() - 0.6).abs() < 1e-12);
        assert!((raw.contributions[0] + 0.6).abs() < 1e-12);

        assert!(matches!(method.attribute(&[0.2], 5), Err(ExplainError::InvalidTarget(5))));
        assert!(matches!(method.attribute(&[], 1), Err(ExplainError::ShapeMismatch { .. })));
    }
}
