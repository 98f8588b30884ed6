//! Existing-test aggregation.
//!
//! Gathers already-tracked test cases from three sources at once: test
//! links on the requested work item, suites scoped to its area path, and a
//! keyword search seeded with the work item's title. Results are merged into one
//! deduplicated index; a failed source degrades into a gap note instead of
//! failing the request.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::ado::WorkTracker;
use crate::budget::CallBudget;
use crate::error::{AdoError, AppResult};
use crate::hierarchy::ResolvedHierarchy;
use crate::models::{
    AdoTestCase, CodeAnalysisInput, ExistingTestIndex, IndexedTestCase, TestProvenance,
};
use crate::retry::RetryPolicy;

const MAX_SEARCH_KEYWORDS: usize = 8;

/// Aggregates existing test cases from the work tracker.
pub struct ExistingTestAggregator<T: WorkTracker> {
    tracker: Arc<T>,
    retry: RetryPolicy,
}

impl<T: WorkTracker> ExistingTestAggregator<T> {
    pub fn new(tracker: Arc<T>, retry: RetryPolicy) -> Self {
        Self { tracker, retry }
    }

    /// Run all three lookups concurrently and merge the results.
    #[instrument(skip_all, fields(work_item_id = resolved.root.id))]
    pub async fn aggregate(
        &self,
        resolved: &ResolvedHierarchy,
        input: &CodeAnalysisInput,
        budget: &CallBudget,
    ) -> AppResult<ExistingTestIndex> {
        budget.charge("get_test_links")?;
        budget.charge("get_test_suites")?;
        budget.charge("search_test_cases")?;

        let keywords = search_keywords(&resolved.root.title, input);
        let (links, suites, search) = tokio::join!(
            self.fetch_links(resolved.root.id),
            self.fetch_suites(&resolved.root.area_path),
            self.fetch_search(&keywords),
        );

        let mut index = ExistingTestIndex::default();

        let mut merged: BTreeMap<u32, IndexedTestCase> = BTreeMap::new();
        match links {
            Ok(cases) => merge(&mut merged, cases, TestProvenance::Linked),
            Err(e) => {
                warn!(error = %e, "Linked test lookup failed");
                index
                    .gap_notes
                    .push(format!("linked test lookup unavailable: {}", e));
            }
        }
        match suites {
            Ok(suites) => index.suites = suites,
            Err(e) => {
                warn!(error = %e, "Test suite lookup failed");
                index
                    .gap_notes
                    .push(format!("test suite lookup unavailable: {}", e));
            }
        }
        match search {
            Ok(cases) => merge(&mut merged, cases, TestProvenance::Keyword),
            Err(e) => {
                warn!(error = %e, "Test case search failed");
                index
                    .gap_notes
                    .push(format!("test case search unavailable: {}", e));
            }
        }

        index.test_cases = merged.into_values().collect();
        info!(
            test_cases = index.test_cases.len(),
            suites = index.suites.len(),
            gaps = index.gap_notes.len(),
            "Aggregated existing tests"
        );
        Ok(index)
    }

    async fn fetch_links(&self, work_item_id: u32) -> Result<Vec<AdoTestCase>, AdoError> {
        self.retry
            .run(
                "get_test_links",
                || self.tracker.get_test_links(work_item_id),
                |e| e.is_transient(),
            )
            .await
    }

    async fn fetch_suites(
        &self,
        area_path: &str,
    ) -> Result<Vec<crate::models::TestSuite>, AdoError> {
        self.retry
            .run(
                "get_test_suites",
                || self.tracker.get_test_suites(area_path),
                |e| e.is_transient(),
            )
            .await
    }

    async fn fetch_search(&self, keywords: &str) -> Result<Vec<AdoTestCase>, AdoError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        self.retry
            .run(
                "search_test_cases",
                || self.tracker.search_test_cases(keywords),
                |e| e.is_transient(),
            )
            .await
    }
}

/// Merge cases into the index, unioning provenance for duplicates.
fn merge(
    merged: &mut BTreeMap<u32, IndexedTestCase>,
    cases: Vec<AdoTestCase>,
    provenance: TestProvenance,
) {
    for case in cases {
        let entry = merged.entry(case.id).or_insert_with(|| IndexedTestCase {
            test_case: case,
            provenance: Vec::new(),
        });
        if !entry.provenance.contains(&provenance) {
            entry.provenance.push(provenance);
            entry.provenance.sort();
        }
    }
}

/// Derive search keywords: the root work item's title terms lead, then
/// changed-file stems and method names augment up to the keyword cap.
fn search_keywords(title: &str, input: &CodeAnalysisInput) -> String {
    let mut keywords: Vec<String> = Vec::new();

    for word in title.split_whitespace() {
        push_keyword(&mut keywords, word);
    }

    for component in &input.changed_components {
        let stem = component
            .file_path
            .rsplit('/')
            .next()
            .unwrap_or(&component.file_path)
            .split('.')
            .next()
            .unwrap_or_default();
        push_keyword(&mut keywords, stem);
        for method in &component.methods {
            push_keyword(&mut keywords, &method.name);
        }
    }

    keywords.join(" ")
}

fn push_keyword(keywords: &mut Vec<String>, candidate: &str) {
    if candidate.is_empty() || keywords.len() >= MAX_SEARCH_KEYWORDS {
        return;
    }
    if keywords.iter().any(|k| k.eq_ignore_ascii_case(candidate)) {
        return;
    }
    keywords.push(candidate.to_string());
}
