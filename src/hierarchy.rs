//! Work item hierarchy resolution.
//!
//! Walks parent links upward from the requested work item, recording each
//! ancestor under its type key until the chain tops out at an Epic or a
//! parentless item. Resolved hierarchies are cached for the configured TTL
//! so repeat requests for the same root skip the tracker entirely.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::ado::{WorkItem, WorkTracker};
use crate::budget::CallBudget;
use crate::cache::TtlCache;
use crate::error::{AppError, AppResult};
use crate::models::{WorkItemHierarchy, WorkItemType};
use crate::retry::RetryPolicy;

/// A resolved hierarchy plus the root item it was resolved from. The root's
/// area path feeds the existing-test lookup without another tracker call.
#[derive(Debug, Clone)]
pub struct ResolvedHierarchy {
    pub hierarchy: WorkItemHierarchy,
    pub root: WorkItem,
}

/// Resolves and caches work item ancestor chains.
pub struct HierarchyResolver<T: WorkTracker> {
    tracker: Arc<T>,
    cache: Arc<TtlCache<ResolvedHierarchy>>,
    retry: RetryPolicy,
    ttl: Duration,
}

impl<T: WorkTracker> HierarchyResolver<T> {
    pub fn new(
        tracker: Arc<T>,
        cache: Arc<TtlCache<ResolvedHierarchy>>,
        retry: RetryPolicy,
        ttl: Duration,
    ) -> Self {
        Self {
            tracker,
            cache,
            retry,
            ttl,
        }
    }

    /// Resolve the hierarchy for `work_item_id`, serving from cache when a
    /// live entry exists. Cache hits charge nothing against the budget.
    #[instrument(skip(self, budget), fields(work_item_id))]
    pub async fn resolve(
        &self,
        work_item_id: u32,
        budget: &CallBudget,
    ) -> AppResult<ResolvedHierarchy> {
        let key = TtlCache::<ResolvedHierarchy>::key("hierarchy", work_item_id);
        self.cache
            .get_or_fetch(&key, self.ttl, || self.walk(work_item_id, budget))
            .await
    }

    async fn walk(&self, work_item_id: u32, budget: &CallBudget) -> AppResult<ResolvedHierarchy> {
        let mut hierarchy = WorkItemHierarchy::default();
        let mut visited: HashSet<u32> = HashSet::new();
        let mut current_id = work_item_id;
        let mut root: Option<WorkItem> = None;

        loop {
            if !visited.insert(current_id) {
                return Err(AppError::DataIntegrity {
                    message: format!(
                        "cyclic parent chain detected at work item {}",
                        current_id
                    ),
                });
            }

            budget.charge("get_work_item")?;
            let item = self
                .retry
                .run(
                    "get_work_item",
                    || self.tracker.get_work_item(current_id),
                    |e| e.is_transient(),
                )
                .await?;

            hierarchy.record(item.to_node());
            let item_type = item.work_item_type;
            if root.is_none() {
                root = Some(item);
            }

            // Epics are topmost; their parent link is never followed.
            if item_type == WorkItemType::Epic {
                break;
            }

            budget.charge("get_relations")?;
            let relations = self
                .retry
                .run(
                    "get_relations",
                    || self.tracker.get_relations(current_id),
                    |e| e.is_transient(),
                )
                .await?;

            // Malformed data can carry several parent links; the first wins.
            match relations
                .iter()
                .find(|r| r.is_parent())
                .and_then(|r| r.target_id())
            {
                Some(parent_id) => current_id = parent_id,
                None => break,
            }
        }

        let root = root.ok_or_else(|| AppError::Internal {
            message: "hierarchy walk produced no root".to_string(),
        })?;

        info!(
            work_item_id,
            nodes = hierarchy.node_count(),
            "Resolved work item hierarchy"
        );

        Ok(ResolvedHierarchy { hierarchy, root })
    }
}
