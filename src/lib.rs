//! # Test Generation Orchestrator
//!
//! A Model Context Protocol (MCP) server that turns a description of a code
//! change into prioritized test cases, cross-referenced against an Azure
//! DevOps work tracker.
//!
//! ## Features
//!
//! - **Hierarchy Resolution**: Walks Task -> User Story -> Feature -> Epic
//!   parent chains, with TTL caching and cycle detection
//! - **Existing-Test Aggregation**: Merges linked test cases, area-path
//!   suites, and keyword search hits into one deduplicated index
//! - **Test Generation**: AI-backed synthesis with a deterministic template
//!   fallback and a queued path when the generator is rate limited
//! - **Classification**: Keyword rules assign every change a priority and
//!   test category
//! - **Traceability**: Maps changed code files to the tests covering them,
//!   plus priority, coverage-gap, and automation recommendations
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → MCP Server (Rust) → Azure DevOps REST / AI generator (HTTP)
//!                    ↓
//!              SQLite (sessions, audit log)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use testgen_orchestrator::{AppState, Config, McpServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = Arc::new(AppState::new(config).await?);
//!     let server = McpServer::new(state);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Work-tracker (Azure DevOps) client and capability trait.
pub mod ado;
/// AI test-synthesis client and capability trait.
pub mod ai;
/// Per-request work-tracker call budget.
pub mod budget;
/// Process-wide TTL cache with per-key locking.
pub mod cache;
/// Change-pattern classification rules.
pub mod classify;
/// Configuration management for the server.
pub mod config;
/// Test case generation engine.
pub mod engine;
/// Error types and result aliases for the application.
pub mod error;
/// Existing-test aggregation across tracker sources.
pub mod existing;
/// Work item hierarchy resolution.
pub mod hierarchy;
/// Domain model for requests and responses.
pub mod models;
/// Request orchestration pipeline.
pub mod orchestrator;
/// System prompts for AI-backed synthesis.
pub mod prompts;
/// Retry policy for upstream calls.
pub mod retry;
/// MCP server implementation and request handling.
pub mod server;
/// SQLite storage layer for persistence.
pub mod storage;
/// Traceability matrix and recommendation building.
pub mod traceability;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, McpServer, SharedState};
