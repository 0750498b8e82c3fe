//! Soft-voting ensemble over heterogeneous members

use std::sync::Arc;

use super::artifact::ArtifactError;
use super::classifier::{argmax, check_width, Classifier, ModelError};
use super::tree::TreeEnsemble;

pub struct VotingClassifier {
    feature_names: Vec<String>,
    classes: Vec<String>,
    members: Vec<Box<dyn Classifier>>,
    weights: Vec<f64>,
}

impl VotingClassifier {
    pub fn new(
        feature_names: Vec<String>,
        classes: Vec<String>,
        members: Vec<Box<dyn Classifier>>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, ArtifactError> {
        if members.is_empty() {
            return Err(ArtifactError::Invalid("voting ensemble without members".to_string()));
        }
        if let Some(member) = members.iter().find(|m| !m.supports_proba()) {
            return Err(ArtifactError::Invalid(format!(
                "soft voting needs probabilities, '{}' has none",
                member.kind()
            )));
        }
        if members.iter().any(|m| m.feature_names() != feature_names.as_slice()) {
            return Err(ArtifactError::Invalid("voting members disagree on features".to_string()));
        }

        let weights = weights.unwrap_or_else(|| vec![1.0; members.len()]);
        if weights.len() != members.len() || weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ArtifactError::Invalid("invalid voting weights".to_string()));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ArtifactError::Invalid("voting weights sum to zero".to_string()));
        }

        Ok(Self {
            feature_names,
            classes,
            members,
            weights,
        })
    }

    pub fn members(&self) -> &[Box<dyn Classifier>] {
        &self.members
    }
}

impl Classifier for VotingClassifier {
    fn kind(&self) -> &str {
        "soft_voting"
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

        let mut proba = vec![0.0; self.classes.len()];
        for (member, weight) in self.members.iter().zip(&self.weights) {
            let p = member.predict_proba(row)?;
            if p.len() != proba.len() {
                return Err(ModelError::Inference(format!(
                    "member '{}' returned {} classes",
                    member.kind(),
                    p.len()
                )));
            }
            for (acc, v) in proba.iter_mut().zip(p) {
                *acc += weight * v;
            }
        }

        let total: f64 = self.weights.iter().sum();
        proba.iter_mut().for_each(|p| *p /= total);
        Ok(proba)
    }

    /// Structure of the first tree-based member
    fn tree_ensemble(&self) -> Option<Arc<TreeEnsemble>> {
        self.members.iter().find_map(|m| m.tree_ensemble())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::linear::{LogisticArrays, LogisticClassifier};
    use crate::logic::model::tree::{tests::stump, ForestClassifier};

    fn names() -> Vec<String> {
        vec!["x0".to_string()]
    }

    fn classes() -> Vec<String> {
        vec!["high".to_string(), "low".to_string()]
    }

    fn members() -> Vec<Box<dyn Classifier>> {
        let forest = ForestClassifier::new(
            names(),
            classes(),
            TreeEnsemble::from_arrays(&[stump()], 1, 2).unwrap(),
            None,
        )
        .unwrap();
        let flat = LogisticClassifier::new(
            names(),
            classes(),
            LogisticArrays {
                coef: vec![vec![0.0], vec![0.0]],
                intercept: vec![0.0, 0.0],
                mean: None,
                scale: None,
            },
        )
        .unwrap();
        vec![Box::new(flat), Box::new(forest)]
    }

    #[test]
    fn test_weighted_average() {
        let voting = VotingClassifier::new(names(), classes(), members(), Some(vec![1.0, 3.0])).unwrap();
        // flat: [0.5, 0.5], forest at x=0: [1, 0]
        let p = voting.predict_proba(&[0.0]).unwrap();
        assert!((p[0] - 0.875).abs() < 1e-12);
        assert!((p[1] - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_exposes_first_tree_member() {
        let voting = VotingClassifier::new(names(), classes(), members(), None).unwrap();
        assert!(voting.tree_ensemble().is_some());
        assert!(voting.feature_importances().is_none());
    }

    #[test]
    fn test_rejects_bad_weights() {
        assert!(VotingClassifier::new(names(), classes(), members(), Some(vec![1.0])).is_err());
        assert!(VotingClassifier::new(names(), classes(), members(), Some(vec![0.0, 0.0])).is_err());
    }
}
