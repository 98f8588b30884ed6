//! Persistence for generation sessions and audit events.
//!
//! The pipeline records outcomes after responding; persistence failures are
//! logged and never affect the response. [`SqliteStorage`] is the concrete
//! implementation.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;
use crate::models::GenerationSession;

/// One audit event tied to a generation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub session_id: String,
    pub event: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(session_id: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            event: event.into(),
            detail: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Storage operations the pipeline depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert or replace a session record.
    async fn save_session(&self, session: &GenerationSession) -> StorageResult<()>;

    /// Fetch a session by id.
    async fn get_session(&self, session_id: &str) -> StorageResult<GenerationSession>;

    /// Most recent sessions, newest first.
    async fn list_recent_sessions(&self, limit: u32) -> StorageResult<Vec<GenerationSession>>;

    /// Append an audit event.
    async fn record_audit(&self, record: &AuditRecord) -> StorageResult<()>;
}
