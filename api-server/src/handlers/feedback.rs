//! Outcome feedback handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use validator::Validate;

use crate::models::{Feedback, FollowUp, SubmitFeedback};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub feedback: Feedback,
}

/// Record the observed outcome for a previous prediction
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitFeedback>,
) -> AppResult<Json<FeedbackResponse>> {
    req.validate()?;

    let notes = req.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let feedback = state
        .feedback
        .record_outcome(req.session_id.trim(), req.actual_outcome.trim(), notes)
        .await?;

    Ok(Json(FeedbackResponse {
        success: true,
        feedback,
    }))
}

#[derive(Debug, Serialize)]
pub struct CompleteFollowUpResponse {
    pub session_id: String,
    pub completed: Vec<FollowUp>,
}

pub async fn complete_follow_up(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<CompleteFollowUpResponse>> {
    if session_id.trim().is_empty() {
        return Err(AppError::ValidationError("session_id is required".to_string()));
    }
    let completed = state.feedback.complete_follow_up(&session_id).await?;
    Ok(Json(CompleteFollowUpResponse { session_id, completed }))
}
