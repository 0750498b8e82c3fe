//! Follow-up reminder model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Sqlite, SqlitePool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FollowUp {
    pub id: i64,
    pub session_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub method: String,
    pub reminder_sent: bool,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FollowUp {
    pub async fn schedule<'e, E>(
        executor: E,
        session_id: &str,
        scheduled_at: DateTime<Utc>,
        method: &str,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, FollowUp>(
            r#"
            INSERT INTO follow_up_schedules (session_id, scheduled_at, method, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(scheduled_at)
        .bind(method)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
    }

    /// Due at or before `now` and not yet completed
    pub async fn list_due(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FollowUp>(
            r#"
            SELECT * FROM follow_up_schedules
            WHERE completed = 0 AND scheduled_at <= ?
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await
    }

    /// Mark every open reminder for the session done
    pub async fn complete(pool: &SqlitePool, session_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FollowUp>(
            r#"
            UPDATE follow_up_schedules
            SET completed = 1, completed_at = ?
            WHERE session_id = ? AND completed = 0
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_due(pool: &SqlitePool, now: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM follow_up_schedules WHERE completed = 0 AND scheduled_at <= ?")
            .bind(now)
            .fetch_one(pool)
            .await
    }
}
