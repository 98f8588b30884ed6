//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state management

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::ado::AdoClient;
use crate::ai::AiClient;
use crate::cache::{SystemClock, TtlCache};
use crate::config::Config;
use crate::error::AppResult;
use crate::hierarchy::ResolvedHierarchy;
use crate::orchestrator::Orchestrator;
use crate::storage::SqliteStorage;

/// Application state shared across handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// SQLite storage backend.
    pub storage: SqliteStorage,
    /// Work tracker client using the configured credential.
    tracker: Arc<AdoClient>,
    /// AI test synthesizer client.
    synthesizer: Arc<AiClient>,
    /// Hierarchy cache shared by every orchestrator this state builds.
    cache: Arc<TtlCache<ResolvedHierarchy>>,
    /// Generation pipeline orchestrator for requests without their own
    /// credential.
    pub orchestrator: Orchestrator<AdoClient, AiClient>,
}

impl AppState {
    /// Create new application state from configuration.
    pub async fn new(config: Config) -> AppResult<Self> {
        let storage = SqliteStorage::new(&config.database).await?;
        let tracker = Arc::new(AdoClient::new(&config.ado, &config.request)?);
        let synthesizer = Arc::new(AiClient::new(&config.ai, &config.request)?);
        let cache = Arc::new(TtlCache::new(Arc::new(SystemClock)));

        let orchestrator = Orchestrator::with_cache(
            Arc::clone(&tracker),
            Arc::clone(&synthesizer),
            Arc::new(storage.clone()),
            &config.request,
            config.orchestrator.clone(),
            Arc::clone(&cache),
        );

        Ok(Self {
            config,
            storage,
            tracker,
            synthesizer,
            cache,
            orchestrator,
        })
    }

    /// Build an orchestrator whose tracker client authenticates with the
    /// request-supplied credential instead of the configured one. The
    /// hierarchy cache is shared with the default orchestrator.
    pub fn scoped_orchestrator(&self, pat: &str) -> Orchestrator<AdoClient, AiClient> {
        Orchestrator::with_cache(
            Arc::new(self.tracker.with_pat(pat)),
            Arc::clone(&self.synthesizer),
            Arc::new(self.storage.clone()),
            &self.config.request,
            self.config.orchestrator.clone(),
            Arc::clone(&self.cache),
        )
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
