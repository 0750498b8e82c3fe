//! Outcome feedback loop
//!
//! Stores every prediction with the features it was made from, schedules a
//! follow-up reminder, accepts one reported outcome per session and joins
//! the two into labeled training pairs.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use mindbloom_core::logic::dataset::{DatasetWriter, LabeledRecord};
use mindbloom_core::{FeatureVector, PredictionResult, RiskLevel};

use crate::models::{CreatePrediction, Feedback, FollowUp, Prediction};

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("a prediction for session '{0}' already exists")]
    DuplicateSession(String),

    #[error("no prediction found for session '{0}'")]
    PredictionNotFound(String),

    #[error("an outcome for session '{0}' was already recorded")]
    OutcomeAlreadyRecorded(String),

    #[error("no open follow-up for session '{0}'")]
    FollowUpNotFound(String),

    #[error("invalid outcome '{0}', expected low, medium or high")]
    InvalidOutcome(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_predictions: i64,
    pub total_feedback: i64,
    /// Percentage of predictions with an outcome
    pub feedback_rate: f64,
    pub average_confidence: Option<f64>,
    pub pending_follow_ups: i64,
    pub risk_distribution: BTreeMap<String, i64>,
    pub outcome_distribution: BTreeMap<String, i64>,
}

#[derive(Clone)]
pub struct FeedbackLoop {
    pool: SqlitePool,
    follow_up_days: i64,
    follow_up_method: String,
    /// Rolling labeled dataset, appended as outcomes arrive
    dataset: Option<Arc<DatasetWriter>>,
}

impl FeedbackLoop {
    pub fn new(pool: SqlitePool, follow_up_days: i64, follow_up_method: impl Into<String>) -> Self {
        Self {
            pool,
            follow_up_days,
            follow_up_method: follow_up_method.into(),
            dataset: None,
        }
    }

    pub fn with_dataset(mut self, writer: DatasetWriter) -> Self {
        self.dataset = Some(Arc::new(writer));
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store a prediction and schedule its follow-up; a reused session id is rejected
    pub async fn record_prediction(
        &self,
        session_id: &str,
        answers: &serde_json::Value,
        features: &FeatureVector,
        result: &PredictionResult,
    ) -> Result<Prediction, FeedbackError> {
        let probabilities = match &result.probabilities {
            Some(p) => Some(serde_json::to_value(p)?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let prediction = Prediction::create(
            &mut *tx,
            CreatePrediction {
                session_id: session_id.to_string(),
                answers: answers.clone(),
                features: serde_json::Value::Object(features.to_json_object()),
                feature_version: features.version,
                layout_hash: features.layout_hash,
                risk_level: result.risk_level.to_string(),
                probabilities,
                confidence: result.confidence,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                FeedbackError::DuplicateSession(session_id.to_string())
            } else {
                FeedbackError::Database(e)
            }
        })?;

        let due = Utc::now() + Duration::days(self.follow_up_days);
        FollowUp::schedule(&mut *tx, session_id, due, &self.follow_up_method).await?;

        tx.commit().await?;
        tracing::debug!("Recorded prediction {} ({}), follow-up due {}", session_id, result.risk_level, due);
        Ok(prediction)
    }

    /// Attach the observed outcome to a stored prediction, at most once
    pub async fn record_outcome(
        &self,
        session_id: &str,
        outcome: &str,
        notes: Option<&str>,
    ) -> Result<Feedback, FeedbackError> {
        let outcome: RiskLevel = outcome
            .parse()
            .map_err(|_| FeedbackError::InvalidOutcome(outcome.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let prediction = Prediction::find_by_session(&mut *tx, session_id)
            .await?
            .ok_or_else(|| FeedbackError::PredictionNotFound(session_id.to_string()))?;

        let feedback = Feedback::create(&mut *tx, session_id, outcome.as_str(), notes)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    FeedbackError::OutcomeAlreadyRecorded(session_id.to_string())
                } else {
                    FeedbackError::Database(e)
                }
            })?;

        tx.commit().await?;
        tracing::info!("Outcome '{}' recorded for session {}", outcome, session_id);

        self.append_labeled(&prediction, outcome).await;
        Ok(feedback)
    }

    async fn append_labeled(&self, prediction: &Prediction, outcome: RiskLevel) {
        let Some(writer) = self.dataset.clone() else {
            return;
        };
        let Some(record) = labeled_record(
            &prediction.session_id,
            &prediction.features.0,
            prediction.feature_version,
            prediction.layout_hash,
            outcome,
            Utc::now(),
        ) else {
            tracing::warn!("Stored features for {} are not an object; not appended", prediction.session_id);
            return;
        };

        let session_id = prediction.session_id.clone();
        let result = tokio::task::spawn_blocking(move || writer.append(&record)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to append labeled record for {}: {}", session_id, e),
            Err(e) => tracing::warn!("Labeled dataset task failed for {}: {}", session_id, e),
        }
    }

    /// Predictions joined with their outcomes; unmatched rows on either side are excluded
    pub async fn collect_labeled_pairs(&self) -> Result<Vec<LabeledRecord>, FeedbackError> {
        let rows = sqlx::query(
            r#"
            SELECT p.session_id, p.features, p.feature_version, p.layout_hash,
                   f.actual_outcome, f.created_at
            FROM predictions p
            INNER JOIN feedback f ON f.session_id = p.session_id
            ORDER BY f.created_at ASC, p.session_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in rows {
            let session_id: String = row.try_get("session_id")?;
            let features: sqlx::types::Json<serde_json::Value> = row.try_get("features")?;
            let outcome: String = row.try_get("actual_outcome")?;

            let Ok(outcome) = outcome.parse::<RiskLevel>() else {
                tracing::warn!("Skipping session {} with unknown outcome '{}'", session_id, outcome);
                continue;
            };
            match labeled_record(
                &session_id,
                &features.0,
                row.try_get("feature_version")?,
                row.try_get("layout_hash")?,
                outcome,
                row.try_get("created_at")?,
            ) {
                Some(record) => pairs.push(record),
                None => tracing::warn!("Skipping session {} with malformed features", session_id),
            }
        }
        Ok(pairs)
    }

    pub async fn pending_follow_ups(&self) -> Result<Vec<FollowUp>, FeedbackError> {
        Ok(FollowUp::list_due(&self.pool, Utc::now()).await?)
    }

    /// Completion is independent of whether an outcome arrived
    pub async fn complete_follow_up(&self, session_id: &str) -> Result<Vec<FollowUp>, FeedbackError> {
        let completed = FollowUp::complete(&self.pool, session_id).await?;
        if completed.is_empty() {
            return Err(FeedbackError::FollowUpNotFound(session_id.to_string()));
        }
        Ok(completed)
    }

    pub async fn statistics(&self) -> Result<Statistics, FeedbackError> {
        let total_predictions = Prediction::count(&self.pool).await?;
        let total_feedback: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
            .fetch_one(&self.pool)
            .await?;
        let average_confidence: Option<f64> = sqlx::query_scalar("SELECT AVG(confidence) FROM predictions")
            .fetch_one(&self.pool)
            .await?;
        let pending_follow_ups = FollowUp::count_due(&self.pool, Utc::now()).await?;

        let risk_distribution = self
            .distribution("SELECT risk_level AS label, COUNT(*) AS n FROM predictions GROUP BY risk_level")
            .await?;
        let outcome_distribution = self
            .distribution("SELECT actual_outcome AS label, COUNT(*) AS n FROM feedback GROUP BY actual_outcome")
            .await?;

        let feedback_rate = if total_predictions > 0 {
            (total_feedback as f64 / total_predictions as f64 * 10000.0).round() / 100.0
        } else {
            0.0
        };

        Ok(Statistics {
            total_predictions,
            total_feedback,
            feedback_rate,
            average_confidence,
            pending_follow_ups,
            risk_distribution,
            outcome_distribution,
        })
    }

    async fn distribution(&self, sql: &str) -> Result<BTreeMap<String, i64>, sqlx::Error> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| Ok((row.try_get::<String, _>("label")?, row.try_get::<i64, _>("n")?)))
            .collect()
    }
}

fn labeled_record(
    session_id: &str,
    features: &serde_json::Value,
    feature_version: i64,
    layout_hash: i64,
    outcome: RiskLevel,
    recorded_at: chrono::DateTime<Utc>,
) -> Option<LabeledRecord> {
    Some(LabeledRecord {
        session_id: session_id.to_string(),
        feature_version: u8::try_from(feature_version).ok()?,
        layout_hash: u32::try_from(layout_hash).ok()?,
        features: features.as_object()?.clone(),
        outcome,
        recorded_at,
    })
}
