//! What kind of attribution a loaded classifier can support

use std::sync::Arc;

use crate::logic::model::{Classifier, TreeEnsemble};

#[derive(Clone)]
pub enum ModelCapability {
    /// Tree structure exposed; exact path-dependent Shapley values
    TreeAttributable(Arc<TreeEnsemble>),
    /// Probabilities available; sampled Shapley values
    SamplingAttributable,
    /// Global importances only
    ImportanceOnly(Vec<f64>),
    Opaque,
}

impl ModelCapability {
    /// Best capability the classifier offers
    pub fn detect(classifier: &dyn Classifier) -> Self {
        let width = classifier.feature_names().len();
        if let Some(ensemble) = classifier.tree_ensemble() {
            if ensemble.n_features() == width {
                return ModelCapability::TreeAttributable(ensemble);
            }
            log::warn!(
                "Tree ensemble has {} features, classifier has {}; skipping exact attribution",
                ensemble.n_features(),
                width
            );
        }
        if classifier.supports_proba() {
            return ModelCapability::SamplingAttributable;
        }
        match classifier.feature_importances() {
            Some(importances) if importances.len() == width => {
                ModelCapability::ImportanceOnly(importances.to_vec())
            }
            _ => ModelCapability::Opaque,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelCapability::TreeAttributable(_) => "tree_attributable",
            ModelCapability::SamplingAttributable => "sampling_attributable",
            ModelCapability::ImportanceOnly(_) => "importance_only",
            ModelCapability::Opaque => "opaque",
        }
    }
}

impl std::fmt::Debug for ModelCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}
