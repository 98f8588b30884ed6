//! End-to-end pipeline tests with in-process fakes for the work tracker,
//! the AI generator, and storage.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use testgen_orchestrator::ado::{WorkItem, WorkItemRelation, WorkTracker};
use testgen_orchestrator::ai::{CandidateTest, TestSynthesizer};
use testgen_orchestrator::config::{OrchestratorConfig, RequestConfig};
use testgen_orchestrator::error::{AdoResult, AiError, AiResult, StorageError, StorageResult};
use testgen_orchestrator::models::{
    AdoConfig, AdoTestCase, AutomationFeasibility, ChangeType, ChangedComponent,
    CodeAnalysisInput, GenerationOptions, MethodChange, RiskLevel, SessionStatus, TestSuite,
    WorkItemType,
};
use testgen_orchestrator::orchestrator::{GenerationRequest, Orchestrator};
use testgen_orchestrator::storage::{AuditRecord, Storage};

const PARENT: &str = "System.LinkTypes.Hierarchy-Reverse";

/// Work tracker fake serving a fixed Task -> Story -> Feature -> Epic chain.
struct FakeTracker {
    hierarchy_calls: AtomicU32,
}

impl FakeTracker {
    fn new() -> Self {
        Self {
            hierarchy_calls: AtomicU32::new(0),
        }
    }

    fn item(id: u32, kind: WorkItemType) -> WorkItem {
        WorkItem {
            id,
            work_item_type: kind,
            title: format!("Item {id}"),
            state: Some("Active".to_string()),
            area_path: "Widgets\\Auth".to_string(),
            acceptance_criteria: None,
        }
    }
}

#[async_trait]
impl WorkTracker for FakeTracker {
    async fn get_work_item(&self, id: u32) -> AdoResult<WorkItem> {
        self.hierarchy_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match id {
            1 => Self::item(1, WorkItemType::Task),
            2 => Self::item(2, WorkItemType::UserStory),
            3 => Self::item(3, WorkItemType::Feature),
            _ => Self::item(4, WorkItemType::Epic),
        })
    }

    async fn get_relations(&self, id: u32) -> AdoResult<Vec<WorkItemRelation>> {
        self.hierarchy_calls.fetch_add(1, Ordering::SeqCst);
        let parent = match id {
            1 => Some(2),
            2 => Some(3),
            3 => Some(4),
            _ => None,
        };
        Ok(parent
            .map(|p| {
                vec![WorkItemRelation {
                    rel: PARENT.to_string(),
                    url: format!("https://dev.azure.com/_apis/wit/workItems/{p}"),
                }]
            })
            .unwrap_or_default())
    }

    async fn get_test_links(&self, _id: u32) -> AdoResult<Vec<AdoTestCase>> {
        Ok(vec![AdoTestCase {
            id: 100,
            title: "Verify login".to_string(),
            state: "Design".to_string(),
            assigned_to: None,
            area_path: "Widgets\\Auth".to_string(),
            iteration_path: String::new(),
            test_suite_id: None,
            last_execution_outcome: None,
        }])
    }

    async fn get_test_suites(&self, _area_path: &str) -> AdoResult<Vec<TestSuite>> {
        Ok(vec![TestSuite {
            id: 10,
            name: "Auth suite".to_string(),
            test_case_count: 3,
            parent_suite_id: None,
        }])
    }

    async fn search_test_cases(&self, _keywords: &str) -> AdoResult<Vec<AdoTestCase>> {
        Ok(vec![])
    }
}

enum SynthesizerBehavior {
    Unavailable,
    RateLimited,
}

struct FakeSynthesizer {
    behavior: SynthesizerBehavior,
}

#[async_trait]
impl TestSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, _system: &str, _user: &str) -> AiResult<Vec<CandidateTest>> {
        match self.behavior {
            SynthesizerBehavior::Unavailable => Err(AiError::Unavailable {
                message: "connection refused".to_string(),
            }),
            SynthesizerBehavior::RateLimited => Err(AiError::RateLimited {
                retry_after_secs: Some(45),
            }),
        }
    }
}

/// Storage fake that accepts writes and holds nothing.
struct NullStorage;

#[async_trait]
impl Storage for NullStorage {
    async fn save_session(
        &self,
        _session: &testgen_orchestrator::models::GenerationSession,
    ) -> StorageResult<()> {
        Ok(())
    }

    async fn get_session(
        &self,
        session_id: &str,
    ) -> StorageResult<testgen_orchestrator::models::GenerationSession> {
        Err(StorageError::SessionNotFound {
            session_id: session_id.to_string(),
        })
    }

    async fn list_recent_sessions(
        &self,
        _limit: u32,
    ) -> StorageResult<Vec<testgen_orchestrator::models::GenerationSession>> {
        Ok(vec![])
    }

    async fn record_audit(&self, _record: &AuditRecord) -> StorageResult<()> {
        Ok(())
    }
}

fn auth_change_request() -> GenerationRequest {
    GenerationRequest {
        code_analysis: CodeAnalysisInput {
            summary: "Adds token validation to the login flow".to_string(),
            changed_components: vec![ChangedComponent {
                file_path: "auth/login.py".to_string(),
                methods: vec![MethodChange {
                    name: "validate_token".to_string(),
                    summary: "validates bearer tokens".to_string(),
                    change_type: ChangeType::Added,
                }],
                risk_level: RiskLevel::Critical,
                ui_component: false,
            }],
            dependency_chains: None,
            risk_level: RiskLevel::Critical,
        },
        ado_config: AdoConfig {
            work_item_id: 1,
            project_name: None,
            organization: None,
            pat: None,
        },
        options: GenerationOptions::default(),
    }
}

fn build_orchestrator(
    tracker: Arc<FakeTracker>,
    behavior: SynthesizerBehavior,
) -> Orchestrator<FakeTracker, FakeSynthesizer> {
    Orchestrator::new(
        tracker,
        Arc::new(FakeSynthesizer { behavior }),
        Arc::new(NullStorage),
        &RequestConfig {
            retry_delay_ms: 1,
            ..RequestConfig::default()
        },
        OrchestratorConfig::default(),
    )
}

#[tokio::test]
async fn test_fallback_generation_for_critical_auth_change() {
    // AI down: the template catalog must still produce a runnable plan for
    // an added method in a security-sensitive backend file.
    let tracker = Arc::new(FakeTracker::new());
    let orch = build_orchestrator(Arc::clone(&tracker), SynthesizerBehavior::Unavailable);

    let response = orch.generate_tests(&auth_change_request()).await.unwrap();

    assert_eq!(response.status, SessionStatus::Completed);
    // Added method: one positive and one negative case, classified
    // Critical / API, so both land in the api bucket.
    assert_eq!(response.generated_tests.api_tests.len(), 2);
    assert!(response.generated_tests.ui_tests.is_empty());
    for case in response.generated_tests.iter() {
        assert_eq!(case.priority.to_string(), "Critical");
        assert_ne!(case.automation_feasibility, AutomationFeasibility::High);
        // Steps are numbered 1..N with no gaps.
        for (i, step) in case.test_steps.iter().enumerate() {
            assert_eq!(step.step_number, i as u32 + 1);
        }
    }

    // Full four-level hierarchy resolved from the task upward.
    let matrix = response.traceability_matrix.unwrap();
    assert!(matrix.work_item_hierarchy.epic.is_some());
    assert!(matrix.work_item_hierarchy.feature.is_some());
    assert!(matrix.work_item_hierarchy.user_story.is_some());
    assert_eq!(matrix.work_item_hierarchy.tasks.len(), 1);

    // Every generated case traces back to the changed file.
    assert_eq!(matrix.test_coverage_map["auth/login.py"].len(), 2);

    // Existing linked test surfaced alongside the generated ones.
    assert_eq!(response.existing_tests.test_cases.len(), 1);
    assert_eq!(response.existing_tests.suites.len(), 1);
}

#[tokio::test]
async fn test_repeat_request_serves_hierarchy_from_cache() {
    let tracker = Arc::new(FakeTracker::new());
    let orch = build_orchestrator(Arc::clone(&tracker), SynthesizerBehavior::Unavailable);

    orch.generate_tests(&auth_change_request()).await.unwrap();
    let first_walk = tracker.hierarchy_calls.load(Ordering::SeqCst);
    // 4 item fetches plus 3 relation fetches (the epic's parent link is
    // never requested).
    assert_eq!(first_walk, 7);

    orch.generate_tests(&auth_change_request()).await.unwrap();
    // Second request resolves from cache without touching the tracker's
    // hierarchy endpoints.
    assert_eq!(tracker.hierarchy_calls.load(Ordering::SeqCst), first_walk);
}

#[tokio::test]
async fn test_rate_limited_request_is_queued_with_estimate() {
    let tracker = Arc::new(FakeTracker::new());
    let orch = build_orchestrator(tracker, SynthesizerBehavior::RateLimited);

    let response = orch.generate_tests(&auth_change_request()).await.unwrap();

    assert_eq!(response.status, SessionStatus::Queued);
    assert_eq!(response.generated_tests.total(), 0);
    assert!(response.traceability_matrix.is_none());
    assert!(response.recommendations.is_none());
    assert!(response.estimated_completion.is_some());
    // Existing tests are still reported so the caller has something to run.
    assert_eq!(response.existing_tests.test_cases.len(), 1);
}

#[tokio::test]
async fn test_recommendations_skip_already_tracked_titles() {
    let tracker = Arc::new(FakeTracker::new());
    let orch = build_orchestrator(tracker, SynthesizerBehavior::Unavailable);

    let response = orch.generate_tests(&auth_change_request()).await.unwrap();
    let recs = response.recommendations.unwrap();

    // Template titles differ from the tracked "Verify login", so both
    // Critical cases are recommended.
    assert_eq!(recs.priority_tests.len(), 2);
    assert!(recs.coverage_gaps.is_empty());
    assert_eq!(recs.automation_candidates.len(), 2);
}
