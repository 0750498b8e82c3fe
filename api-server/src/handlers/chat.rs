//! Supportive chat handler

use axum::{extract::State, Json};
use serde::Deserialize;

use mindbloom_core::RiskLevel;

use crate::chat::{ChatMessage, ChatReply};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub risk_level: Option<String>,
}

pub async fn reply(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> AppResult<Json<ChatReply>> {
    if req.messages.iter().all(|m| m.content.trim().is_empty()) {
        return Err(AppError::ValidationError("messages must contain at least one non-empty message".to_string()));
    }

    let risk_level = match req.risk_level.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<RiskLevel>()
                .map_err(|_| AppError::ValidationError(format!("Unknown risk_level '{}'", raw)))?,
        ),
        None => None,
    };

    Ok(Json(state.chat.reply(&req.messages, risk_level).await))
}
