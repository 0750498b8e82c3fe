//! Database module - SQLite connection and migrations

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Single-connection in-memory database with the schema applied
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    run_migrations(&pool).await.expect("schema");
    pool
}

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Multi-statement script; plain `query` only runs the first statement
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Predictions (one per session)
CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL UNIQUE,
    answers TEXT NOT NULL,
    features TEXT NOT NULL,
    feature_version INTEGER NOT NULL,
    layout_hash INTEGER NOT NULL,
    risk_level TEXT NOT NULL,
    probabilities TEXT,
    confidence REAL,
    created_at TEXT NOT NULL
);

-- Feedback (actual outcomes, at most one per session)
CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL UNIQUE REFERENCES predictions(session_id),
    actual_outcome TEXT NOT NULL CHECK (actual_outcome IN ('low', 'medium', 'high')),
    notes TEXT,
    created_at TEXT NOT NULL
);

-- Follow-up reminders
CREATE TABLE IF NOT EXISTS follow_up_schedules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES predictions(session_id),
    scheduled_at TEXT NOT NULL,
    method TEXT NOT NULL,
    reminder_sent INTEGER NOT NULL DEFAULT 0,
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT,
    created_at TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_predictions_created ON predictions(created_at);
CREATE INDEX IF NOT EXISTS idx_predictions_risk ON predictions(risk_level);
CREATE INDEX IF NOT EXISTS idx_follow_ups_due ON follow_up_schedules(completed, scheduled_at);
CREATE INDEX IF NOT EXISTS idx_follow_ups_session ON follow_up_schedules(session_id);
"#;
