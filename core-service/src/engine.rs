//! Triage Engine - startup wiring for the whole pipeline
//!
//! Loads every artifact once, fails fast on anything unusable, and hands
//! out the shared, read-only stages.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::constants::{get_top_k, APP_NAME, APP_VERSION};
use crate::logic::encoding::{EncodingError, LabelEncodingTable};
use crate::logic::explain::{AttributionReport, AttributionStrategy, Background, ExplainError, Explainer, ExplainerConfig};
use crate::logic::features::{layout, AnswerSet, FeatureDeriver, FeatureVector, LayoutInfo};
use crate::logic::model::{
    load_model, AlignedRow, ArtifactError, Classifier, EngineStatus, ModelMetadata, PredictionError, PredictionResult,
    PredictionService,
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("encoding table: {0}")]
    Encoding(#[from] EncodingError),

    #[error("model artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("prediction service: {0}")]
    Prediction(#[from] PredictionError),

    #[error("explainer: {0}")]
    Explain(#[from] ExplainError),
}

/// Where the engine's artifacts live
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    /// ONNX schema sidecar; defaults next to the model
    pub schema_path: Option<PathBuf>,
    /// Built-in training table when unset
    pub encoding_table_path: Option<PathBuf>,
    /// Training rows for sampling attribution; all-zero baseline when unset
    pub background_path: Option<PathBuf>,
    pub top_k: usize,
    pub explainer: ExplainerConfig,
}

impl EngineConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            schema_path: None,
            encoding_table_path: None,
            background_path: None,
            top_k: get_top_k(),
            explainer: ExplainerConfig::from_env(),
        }
    }
}

pub struct TriageEngine {
    deriver: FeatureDeriver,
    predictor: PredictionService,
    explainer: Explainer,
    top_k: usize,
}

impl TriageEngine {
    /// Load table, model and background, then build the explainer plan
    pub fn load(config: &EngineConfig) -> Result<Self, StartupError> {
        log::info!("{} core v{} loading {}", APP_NAME, APP_VERSION, config.model_path.display());
        let table = match &config.encoding_table_path {
            Some(path) => LabelEncodingTable::load(path)?,
            None => {
                log::info!("Using built-in encoding table ({} columns)", LabelEncodingTable::training_default().len());
                LabelEncodingTable::training_default()
            }
        };

        let loaded = load_model(&config.model_path, config.schema_path.as_deref())?;
        log::info!(
            "Model {} ({}) checksum={} features={}",
            loaded.metadata.model_name,
            loaded.metadata.model_kind,
            loaded.metadata.checksum,
            loaded.metadata.features
        );

        let background = match &config.background_path {
            Some(path) => match Background::from_csv(
                path,
                loaded.classifier.feature_names(),
                config.explainer.background_rows,
                config.explainer.seed,
            ) {
                Ok(background) => Some(background),
                Err(e) => {
                    log::warn!("Background data unusable, using zero baseline: {}", e);
                    None
                }
            },
            None => None,
        };

        let mut engine = Self::from_parts(
            loaded.classifier,
            Arc::new(table),
            &config.explainer,
            background,
            Some(loaded.metadata),
        )?;
        engine.top_k = config.top_k;
        Ok(engine)
    }

    pub fn from_parts(
        classifier: Arc<dyn Classifier>,
        table: Arc<LabelEncodingTable>,
        explainer_config: &ExplainerConfig,
        background: Option<Background>,
        metadata: Option<ModelMetadata>,
    ) -> Result<Self, StartupError> {
        let info = LayoutInfo::current();
        log::info!(
            "Feature layout v{} hash={:08x} ({} columns)",
            info.version,
            info.hash,
            info.feature_count
        );
        for column in layout::unknown_columns(classifier.feature_names()) {
            log::warn!("Model expects column '{}' the derivation engine does not produce", column);
        }

        let mut predictor = PredictionService::new(Arc::clone(&classifier), Arc::clone(&table))?;
        if let Some(metadata) = metadata {
            predictor = predictor.with_metadata(metadata);
        }

        let explainer = Explainer::build(classifier, predictor.labels(), explainer_config, background)?;
        log::info!(
            "Explainer plan ({}): {:?}",
            explainer.capability(),
            explainer.strategies().iter().map(|s| s.as_str()).collect::<Vec<_>>()
        );

        Ok(Self {
            deriver: FeatureDeriver::new(table),
            predictor,
            explainer,
            top_k: get_top_k(),
        })
    }

    pub fn derive(&self, answers: &AnswerSet) -> FeatureVector {
        self.deriver.derive(answers)
    }

    pub fn align(&self, features: &FeatureVector) -> AlignedRow {
        self.predictor.align(features)
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, PredictionError> {
        self.predictor.predict(features)
    }

    /// Attribution for a derived vector; `top_k` falls back to the configured default
    pub fn explain(&self, features: &FeatureVector, top_k: Option<usize>) -> AttributionReport {
        let row = self.predictor.align(features);
        self.explainer.explain(&row.values, top_k.unwrap_or(self.top_k))
    }

    pub fn deriver(&self) -> &FeatureDeriver {
        &self.deriver
    }

    pub fn predictor(&self) -> &PredictionService {
        &self.predictor
    }

    pub fn explainer(&self) -> &Explainer {
        &self.explainer
    }

    pub fn explainer_plan(&self) -> Vec<AttributionStrategy> {
        self.explainer.strategies()
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.predictor.metadata()
    }

    pub fn status(&self) -> EngineStatus {
        self.predictor.status()
    }
}
