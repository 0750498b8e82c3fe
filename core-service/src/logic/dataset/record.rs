use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::features::FeatureVector;
use crate::logic::model::RiskLevel;

/// One supervised training example: the features seen at prediction time
/// and the outcome reported later
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub session_id: String,

    // Feature contract
    pub feature_version: u8,
    pub layout_hash: u32,
    pub features: serde_json::Map<String, serde_json::Value>,

    // Ground truth
    pub outcome: RiskLevel,
    pub recorded_at: DateTime<Utc>,
}

impl LabeledRecord {
    pub fn new(session_id: impl Into<String>, features: &FeatureVector, outcome: RiskLevel) -> Self {
        Self {
            session_id: session_id.into(),
            feature_version: features.version,
            layout_hash: features.layout_hash,
            features: features.to_json_object(),
            outcome,
            recorded_at: Utc::now(),
        }
    }
}
