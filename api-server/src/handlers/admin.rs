//! Admin handlers: follow-up queue, statistics and training export

use std::path::PathBuf;

use axum::{extract::State, Json};
use serde::Serialize;

use mindbloom_core::logic::dataset::write_snapshot;

use crate::feedback_loop::Statistics;
use crate::models::FollowUp;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub count: usize,
    pub follow_ups: Vec<FollowUp>,
}

pub async fn pending_follow_ups(State(state): State<AppState>) -> AppResult<Json<PendingResponse>> {
    let follow_ups = state.feedback.pending_follow_ups().await?;
    Ok(Json(PendingResponse {
        count: follow_ups.len(),
        follow_ups,
    }))
}

pub async fn stats(State(state): State<AppState>) -> AppResult<Json<Statistics>> {
    Ok(Json(state.feedback.statistics().await?))
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub exported: usize,
    pub path: Option<PathBuf>,
}

/// Snapshot every labeled pair into a fresh JSONL file
pub async fn export(State(state): State<AppState>) -> AppResult<Json<ExportResponse>> {
    let records = state.feedback.collect_labeled_pairs().await?;
    if records.is_empty() {
        tracing::info!("Export requested with no labeled pairs");
        return Ok(Json(ExportResponse { exported: 0, path: None }));
    }

    let dir = PathBuf::from(&state.config.export_dir);
    let (path, exported) = tokio::task::spawn_blocking(move || write_snapshot(&dir, &records))
        .await?
        .map_err(|e| AppError::InternalError(format!("Export failed: {}", e)))?;

    tracing::info!("Exported {} labeled pairs to {}", exported, path.display());
    Ok(Json(ExportResponse {
        exported,
        path: Some(path),
    }))
}
