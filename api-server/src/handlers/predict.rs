//! Prediction handler

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mindbloom_core::logic::explain::summarize_risk_factors;
use mindbloom_core::logic::features::answers::coerce_number;
use mindbloom_core::{AnswerSet, AttributionReport, RiskFactorSummary, RiskLevel};

use crate::feedback_loop::FeedbackError;
use crate::{AppError, AppResult, AppState};

/// Envelope form; a body without `answers` is read as the answers themselves
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub answers: serde_json::Map<String, serde_json::Value>,
    pub session_id: Option<String>,
    pub top_k: Option<usize>,
    #[serde(default = "default_explain")]
    pub explain: bool,
}

fn default_explain() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub session_id: String,
    pub risk_level: RiskLevel,
    pub probabilities: Option<BTreeMap<RiskLevel, f64>>,
    pub confidence: Option<f64>,
    pub shap_explanation: Option<AttributionReport>,
    pub risk_factors: Option<RiskFactorSummary>,
    pub feedback_recorded: bool,
}

fn parse_request(body: serde_json::Value) -> AppResult<PredictRequest> {
    let serde_json::Value::Object(map) = body else {
        return Err(AppError::ValidationError("Request body must be a JSON object".to_string()));
    };

    if map.get("answers").map_or(false, |a| a.is_object()) {
        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| AppError::ValidationError(format!("Invalid request: {}", e)))
    } else {
        Ok(PredictRequest {
            answers: map,
            session_id: None,
            top_k: None,
            explain: true,
        })
    }
}

/// Classify an answer set, explain it, and record it for follow-up
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<PredictResponse>> {
    let req = parse_request(body)?;
    let answers = AnswerSet::from_map(req.answers);

    if answers.get("age").and_then(coerce_number).is_none() {
        return Err(AppError::Unprocessable("Field 'age' is required and must be numeric".to_string()));
    }

    let session_id = req
        .session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // CPU-bound stages run off the async workers
    let engine = state.engine.clone();
    let input = answers.clone();
    let (features, prediction) = tokio::task::spawn_blocking(move || {
        let features = engine.derive(&input);
        let prediction = engine.predict(&features);
        (features, prediction)
    })
    .await?;
    let prediction = prediction.map_err(|e| AppError::PredictionFailed(e.to_string()))?;

    let explanation = if req.explain {
        let engine = state.engine.clone();
        let vector = features.clone();
        let top_k = req.top_k.filter(|k| *k > 0);
        let task = tokio::task::spawn_blocking(move || engine.explain(&vector, top_k));

        match tokio::time::timeout(state.config.explain_timeout(), task).await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                tracing::warn!("Explanation task failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!("Explanation exceeded {}ms; returning without it", state.config.explain_timeout_ms);
                None
            }
        }
    } else {
        None
    };
    let risk_factors = explanation.as_ref().map(summarize_risk_factors);

    let answers_json = serde_json::Value::Object(answers.as_map().clone());
    let feedback_recorded = match state
        .feedback
        .record_prediction(&session_id, &answers_json, &features, &prediction)
        .await
    {
        Ok(_) => true,
        Err(e @ FeedbackError::DuplicateSession(_)) => return Err(e.into()),
        Err(e) => {
            tracing::warn!("Prediction {} not recorded: {}", session_id, e);
            false
        }
    };

    tracing::info!(
        "Prediction {}: {} (confidence {:?})",
        session_id,
        prediction.risk_level,
        prediction.confidence
    );

    Ok(Json(PredictResponse {
        session_id,
        risk_level: prediction.risk_level,
        probabilities: prediction.probabilities,
        confidence: prediction.confidence,
        shap_explanation: explanation,
        risk_factors,
        feedback_recorded,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_and_envelope_bodies() {
        let flat = parse_request(json!({"age": 28, "phq9_score": 12})).unwrap();
        assert_eq!(flat.answers.len(), 2);
        assert!(flat.explain);

        let envelope = parse_request(json!({
            "answers": {"age": 28},
            "session_id": "abc",
            "top_k": 3,
            "explain": false
        }))
        .unwrap();
        assert_eq!(envelope.session_id.as_deref(), Some("abc"));
        assert_eq!(envelope.top_k, Some(3));
        assert!(!envelope.explain);

        assert!(parse_request(json!([1, 2])).is_err());
    }
}
