//! Model status handler

use axum::{extract::State, Json};
use serde::Serialize;

use mindbloom_core::logic::explain::AttributionStrategy;
use mindbloom_core::logic::features::LayoutInfo;
use mindbloom_core::logic::model::{EngineStatus, ModelMetadata};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ExplainerStatus {
    pub capability: &'static str,
    /// Strategies in the order they are tried
    pub plan: Vec<AttributionStrategy>,
}

#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub engine: EngineStatus,
    pub metadata: Option<ModelMetadata>,
    pub explainer: ExplainerStatus,
    pub layout: LayoutInfo,
}

pub async fn status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    let engine = &state.engine;
    Json(ModelStatusResponse {
        engine: engine.status(),
        metadata: engine.metadata().cloned(),
        explainer: ExplainerStatus {
            capability: engine.explainer().capability(),
            plan: engine.explainer_plan(),
        },
        layout: LayoutInfo::current(),
    })
}
