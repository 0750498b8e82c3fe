//! Prediction model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, Sqlite, SqlitePool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Prediction {
    pub id: i64,
    pub session_id: String,
    pub answers: Json<serde_json::Value>,
    pub features: Json<serde_json::Value>,
    pub feature_version: i64,
    pub layout_hash: i64,
    pub risk_level: String,
    pub probabilities: Option<Json<serde_json::Value>>,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CreatePrediction {
    pub session_id: String,
    pub answers: serde_json::Value,
    pub features: serde_json::Value,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub risk_level: String,
    pub probabilities: Option<serde_json::Value>,
    pub confidence: Option<f64>,
}

impl Prediction {
    pub async fn create<'e, E>(executor: E, data: CreatePrediction) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Prediction>(
            r#"
            INSERT INTO predictions (session_id, answers, features, feature_version, layout_hash, risk_level, probabilities, confidence, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&data.session_id)
        .bind(Json(&data.answers))
        .bind(Json(&data.features))
        .bind(i64::from(data.feature_version))
        .bind(i64::from(data.layout_hash))
        .bind(&data.risk_level)
        .bind(data.probabilities.as_ref().map(Json))
        .bind(data.confidence)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_session<'e, E>(executor: E, session_id: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Prediction>("SELECT * FROM predictions WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM predictions")
            .fetch_one(pool)
            .await
    }
}
