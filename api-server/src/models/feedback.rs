//! Feedback model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite};
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub session_id: String,
    pub actual_outcome: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitFeedback {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,

    /// low | medium | high
    #[validate(length(min = 1, max = 32))]
    pub actual_outcome: String,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl Feedback {
    pub async fn create<'e, E>(
        executor: E,
        session_id: &str,
        outcome: &str,
        notes: Option<&str>,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (session_id, actual_outcome, notes, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(outcome)
        .bind(notes)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
    }
}
