use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::{AuditRecord, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::models::{GenerationSession, SessionStatus};

/// SQLite-backed storage.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the database and ensure the schema exists.
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                    message: format!("Failed to create database directory: {}", e),
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open database: {}", e),
            })?;

        let storage = Self { pool };
        storage.init_schema().await?;
        info!(path = %config.path.display(), "Storage initialized");
        Ok(storage)
    }

    /// In-memory database, used by tests. A single connection keeps every
    /// query on the same database instance.
    pub async fn new_in_memory() -> StorageResult<Self> {
        Self::new(&DatabaseConfig {
            path: std::path::PathBuf::from(":memory:"),
            max_connections: 1,
        })
        .await
    }

    async fn init_schema(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS generation_sessions (
                id TEXT PRIMARY KEY,
                work_item_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                completed_at TEXT,
                error_detail TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                event TEXT NOT NULL,
                detail TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_audit_session ON audit_log (session_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> StorageResult<GenerationSession> {
        let status: String = row.get("status");
        let created_at: String = row.get("created_at");
        let completed_at: Option<String> = row.get("completed_at");

        Ok(GenerationSession {
            id: row.get("id"),
            work_item_id: row.get::<i64, _>("work_item_id") as u32,
            status: SessionStatus::from_str(&status).map_err(|e| StorageError::Query {
                message: format!("Corrupt session status: {}", e),
            })?,
            created_at: parse_timestamp(&created_at)?,
            completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
            error_detail: row.get("error_detail"),
        })
    }
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Query {
            message: format!("Corrupt timestamp '{}': {}", value, e),
        })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save_session(&self, session: &GenerationSession) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO generation_sessions
                (id, work_item_id, status, created_at, completed_at, error_detail)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(session.work_item_id as i64)
        .bind(session.status.to_string())
        .bind(session.created_at.to_rfc3339())
        .bind(session.completed_at.map(|t| t.to_rfc3339()))
        .bind(&session.error_detail)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> StorageResult<GenerationSession> {
        let row = sqlx::query("SELECT * FROM generation_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        Self::row_to_session(&row)
    }

    async fn list_recent_sessions(&self, limit: u32) -> StorageResult<Vec<GenerationSession>> {
        let rows =
            sqlx::query("SELECT * FROM generation_sessions ORDER BY created_at DESC LIMIT ?")
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(Self::row_to_session).collect()
    }

    async fn record_audit(&self, record: &AuditRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (id, session_id, event, detail, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.session_id)
        .bind(&record.event)
        .bind(&record.detail)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
