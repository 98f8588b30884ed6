//! Work-tracker (Azure DevOps) client and capability trait.
//!
//! The orchestration core talks to the tracker only through [`WorkTracker`],
//! so tests can substitute a mock; [`AdoClient`] is the HTTP implementation.

mod client;
mod types;

pub use client::AdoClient;
pub use types::{WorkItem, WorkItemRelation};

use async_trait::async_trait;

use crate::error::AdoResult;
use crate::models::{AdoTestCase, TestSuite};

/// Capability the work-tracking system provides to the pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkTracker: Send + Sync {
    /// Fetch a single work item's fields.
    async fn get_work_item(&self, id: u32) -> AdoResult<WorkItem>;

    /// Fetch a work item's relations.
    async fn get_relations(&self, id: u32) -> AdoResult<Vec<WorkItemRelation>>;

    /// Fetch test cases directly linked to a work item.
    async fn get_test_links(&self, id: u32) -> AdoResult<Vec<AdoTestCase>>;

    /// Fetch test suites scoped to an area path.
    async fn get_test_suites(&self, area_path: &str) -> AdoResult<Vec<TestSuite>>;

    /// Keyword search over test cases.
    async fn search_test_cases(&self, keywords: &str) -> AdoResult<Vec<AdoTestCase>>;
}
