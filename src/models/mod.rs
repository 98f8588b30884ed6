//! Domain model for test generation requests and responses.
//!
//! Input types describe a code change (changed components, method changes,
//! risk); output types carry generated test cases, the existing-test index,
//! the traceability matrix, and recommendations.

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Maximum length for a generated test case title.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum length for a generated test case description.
pub const MAX_DESCRIPTION_LEN: usize = 1000;
/// Maximum length for the code-change summary.
pub const MAX_SUMMARY_LEN: usize = 10_000;

/// Risk classification of a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Kind of change applied to a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

/// A single method-level change within a component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodChange {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    pub change_type: ChangeType,
}

/// A changed file with its method-level changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedComponent {
    pub file_path: String,
    pub methods: Vec<MethodChange>,
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Explicit UI flag; when absent the file path heuristic decides.
    #[serde(default)]
    pub ui_component: bool,
}

/// Dependency chain from a changed file to the files it impacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyChain {
    pub file_path: String,
    #[serde(default)]
    pub impacted_files: Vec<String>,
}

/// Description of a code change, immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeAnalysisInput {
    pub summary: String,
    pub changed_components: Vec<ChangedComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_chains: Option<Vec<DependencyChain>>,
    #[serde(default)]
    pub risk_level: RiskLevel,
}

impl CodeAnalysisInput {
    /// Validate input bounds before the pipeline touches upstreams.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.summary.trim().is_empty() {
            return Err(AppError::InvalidRequest {
                message: "summary cannot be empty".to_string(),
            });
        }
        if self.summary.len() > MAX_SUMMARY_LEN {
            return Err(AppError::InvalidRequest {
                message: format!("summary exceeds {MAX_SUMMARY_LEN} characters"),
            });
        }
        if self.changed_components.is_empty() {
            return Err(AppError::InvalidRequest {
                message: "at least one changed component is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Identifies the work-item traversal root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoConfig {
    pub work_item_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Request-scoped tracker credential, treated opaquely and forwarded to
    /// the work tracker. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub pat: Option<String>,
}

impl AdoConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.work_item_id == 0 {
            return Err(AppError::InvalidRequest {
                message: "work_item_id must be a positive integer".to_string(),
            });
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_max_test_cases() -> usize {
    20
}

/// Options governing generation volume and shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default = "default_true")]
    pub include_ui_tests: bool,
    #[serde(default = "default_true")]
    pub include_api_tests: bool,
    #[serde(default = "default_max_test_cases")]
    pub max_test_cases: usize,
    #[serde(default)]
    pub test_frameworks: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            include_ui_tests: true,
            include_api_tests: true,
            max_test_cases: default_max_test_cases(),
            test_frameworks: Vec::new(),
        }
    }
}

impl GenerationOptions {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_test_cases == 0 || self.max_test_cases > 50 {
            return Err(AppError::InvalidRequest {
                message: "max_test_cases must be between 1 and 50".to_string(),
            });
        }
        Ok(())
    }
}

/// Work item type, ordered from leaf to topmost ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkItemType {
    Task,
    #[serde(rename = "User Story")]
    UserStory,
    Feature,
    Epic,
}

impl std::fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkItemType::Task => write!(f, "Task"),
            WorkItemType::UserStory => write!(f, "User Story"),
            WorkItemType::Feature => write!(f, "Feature"),
            WorkItemType::Epic => write!(f, "Epic"),
        }
    }
}

impl std::str::FromStr for WorkItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Task" => Ok(WorkItemType::Task),
            "User Story" => Ok(WorkItemType::UserStory),
            "Feature" => Ok(WorkItemType::Feature),
            "Epic" => Ok(WorkItemType::Epic),
            _ => Err(format!("Unknown work item type: {}", s)),
        }
    }
}

/// A resolved work item node in the ancestor chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItemNode {
    pub id: u32,
    pub work_item_type: WorkItemType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
}

/// Work item chain Task -> User Story -> Feature -> Epic, plus sibling tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkItemHierarchy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic: Option<WorkItemNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<WorkItemNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_story: Option<WorkItemNode>,
    #[serde(default)]
    pub tasks: Vec<WorkItemNode>,
}

impl WorkItemHierarchy {
    /// Record a node under its type key.
    pub fn record(&mut self, node: WorkItemNode) {
        match node.work_item_type {
            WorkItemType::Epic => self.epic = Some(node),
            WorkItemType::Feature => self.feature = Some(node),
            WorkItemType::UserStory => self.user_story = Some(node),
            WorkItemType::Task => self.tasks.push(node),
        }
    }

    /// Number of type keys populated (tasks count as one).
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        if self.epic.is_some() {
            count += 1;
        }
        if self.feature.is_some() {
            count += 1;
        }
        if self.user_story.is_some() {
            count += 1;
        }
        if !self.tasks.is_empty() {
            count += 1;
        }
        count
    }
}

/// Test case already tracked by the work-tracking system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoTestCase {
    pub id: u32,
    pub title: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub area_path: String,
    #[serde(default)]
    pub iteration_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_suite_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_execution_outcome: Option<String>,
}

/// Test suite metadata from the work tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuite {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub test_case_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_suite_id: Option<u32>,
}

/// How an existing test case was discovered. Suites are reported as their
/// own list, so only the two per-case sources appear here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TestProvenance {
    Linked,
    Keyword,
}

/// An existing test case tagged with every source that surfaced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedTestCase {
    #[serde(flatten)]
    pub test_case: AdoTestCase,
    pub provenance: Vec<TestProvenance>,
}

/// Deduplicated index of existing tests and suites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExistingTestIndex {
    pub test_cases: Vec<IndexedTestCase>,
    pub suites: Vec<TestSuite>,
    /// Sources that were unavailable during aggregation.
    #[serde(default)]
    pub gap_notes: Vec<String>,
}

/// Generated test case priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl TestPriority {
    /// Rank for ordering; lower runs first.
    pub fn rank(&self) -> u8 {
        match self {
            TestPriority::Critical => 0,
            TestPriority::High => 1,
            TestPriority::Medium => 2,
            TestPriority::Low => 3,
        }
    }

    /// Numeric priority the work tracker uses (Critical=1 .. Low=4).
    pub fn ado_priority(&self) -> u8 {
        self.rank() + 1
    }
}

impl std::fmt::Display for TestPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestPriority::Critical => write!(f, "Critical"),
            TestPriority::High => write!(f, "High"),
            TestPriority::Medium => write!(f, "Medium"),
            TestPriority::Low => write!(f, "Low"),
        }
    }
}

impl std::str::FromStr for TestPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(TestPriority::Critical),
            "high" => Ok(TestPriority::High),
            "medium" => Ok(TestPriority::Medium),
            "low" => Ok(TestPriority::Low),
            _ => Err(format!("Unknown test priority: {}", s)),
        }
    }
}

/// Generated test case category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestCategory {
    #[serde(rename = "API")]
    Api,
    #[serde(rename = "UI")]
    Ui,
    Integration,
    Unit,
    Performance,
    Security,
}

impl std::fmt::Display for TestCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestCategory::Api => write!(f, "API"),
            TestCategory::Ui => write!(f, "UI"),
            TestCategory::Integration => write!(f, "Integration"),
            TestCategory::Unit => write!(f, "Unit"),
            TestCategory::Performance => write!(f, "Performance"),
            TestCategory::Security => write!(f, "Security"),
        }
    }
}

impl std::str::FromStr for TestCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(TestCategory::Api),
            "ui" => Ok(TestCategory::Ui),
            "integration" => Ok(TestCategory::Integration),
            "unit" => Ok(TestCategory::Unit),
            "performance" => Ok(TestCategory::Performance),
            "security" => Ok(TestCategory::Security),
            _ => Err(format!("Unknown test category: {}", s)),
        }
    }
}

/// How easily a test case can be automated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutomationFeasibility {
    High,
    Medium,
    Low,
    #[serde(rename = "Manual Only")]
    ManualOnly,
}

impl std::fmt::Display for AutomationFeasibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutomationFeasibility::High => write!(f, "High"),
            AutomationFeasibility::Medium => write!(f, "Medium"),
            AutomationFeasibility::Low => write!(f, "Low"),
            AutomationFeasibility::ManualOnly => write!(f, "Manual Only"),
        }
    }
}

impl std::str::FromStr for AutomationFeasibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(AutomationFeasibility::High),
            "medium" => Ok(AutomationFeasibility::Medium),
            "low" => Ok(AutomationFeasibility::Low),
            "manual only" | "manual" => Ok(AutomationFeasibility::ManualOnly),
            _ => Err(format!("Unknown automation feasibility: {}", s)),
        }
    }
}

/// One ordered step within a test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestStep {
    pub step_number: u32,
    pub action: String,
    pub expected_result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_data: Option<String>,
}

/// A generated test case, immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTestCase {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: TestPriority,
    pub category: TestCategory,
    pub test_steps: Vec<TestStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<String>,
    pub automation_feasibility: AutomationFeasibility,
    /// Estimated execution duration in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_code_files: Vec<String>,
}

impl GeneratedTestCase {
    /// Build a test case with a fresh id, bounded title/description, and
    /// steps renumbered 1..N.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: TestPriority,
        category: TestCategory,
        steps: Vec<TestStep>,
        preconditions: Option<String>,
        automation_feasibility: AutomationFeasibility,
        related_code_files: Vec<String>,
    ) -> Self {
        let mut title: String = title.into();
        truncate_at_char_boundary(&mut title, MAX_TITLE_LEN);
        let mut description: String = description.into();
        truncate_at_char_boundary(&mut description, MAX_DESCRIPTION_LEN);

        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            priority,
            category,
            test_steps: renumber_steps(steps),
            preconditions,
            automation_feasibility,
            estimated_duration: None,
            tags: Vec::new(),
            related_code_files,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_estimated_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }
}

/// Truncate to at most `max_bytes`, backing up to the nearest char boundary
/// so multibyte content never splits mid-character.
fn truncate_at_char_boundary(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

/// Renumber steps 1..N, strictly increasing with no gaps.
pub fn renumber_steps(mut steps: Vec<TestStep>) -> Vec<TestStep> {
    for (i, step) in steps.iter_mut().enumerate() {
        step.step_number = i as u32 + 1;
    }
    steps
}

/// Generated tests grouped by category bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedTests {
    pub api_tests: Vec<GeneratedTestCase>,
    pub ui_tests: Vec<GeneratedTestCase>,
    pub integration_tests: Vec<GeneratedTestCase>,
}

impl GeneratedTests {
    /// Bucket cases by category: UI -> ui_tests, API -> api_tests,
    /// everything else -> integration_tests.
    pub fn from_cases(cases: Vec<GeneratedTestCase>) -> Self {
        let mut tests = GeneratedTests::default();
        for case in cases {
            match case.category {
                TestCategory::Ui => tests.ui_tests.push(case),
                TestCategory::Api => tests.api_tests.push(case),
                _ => tests.integration_tests.push(case),
            }
        }
        tests
    }

    pub fn total(&self) -> usize {
        self.api_tests.len() + self.ui_tests.len() + self.integration_tests.len()
    }

    /// Iterate all cases across buckets.
    pub fn iter(&self) -> impl Iterator<Item = &GeneratedTestCase> {
        self.api_tests
            .iter()
            .chain(self.ui_tests.iter())
            .chain(self.integration_tests.iter())
    }
}

/// Code artifacts cross-linked to the tests that exercise them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceabilityMatrix {
    pub work_item_hierarchy: WorkItemHierarchy,
    /// Code file path -> ids of tests covering it. BTreeMap keeps output
    /// deterministic.
    pub test_coverage_map: BTreeMap<String, Vec<String>>,
}

/// Recommendation lists computed from generated and existing tests. The
/// test entries are generated-case ids, matching the coverage map values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendations {
    /// Critical/High cases with no existing equivalent in the tracker.
    pub priority_tests: Vec<String>,
    /// Changed files no generated test covers.
    pub coverage_gaps: Vec<String>,
    /// Cases with High or Medium automation feasibility.
    pub automation_candidates: Vec<String>,
}

/// Lifecycle status of a generation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    Queued,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Queued => write!(f, "queued"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(SessionStatus::Completed),
            "queued" => Ok(SessionStatus::Queued),
            "failed" => Ok(SessionStatus::Failed),
            _ => Err(format!("Unknown session status: {}", s)),
        }
    }
}

/// One generation request's lifecycle record, persisted after completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSession {
    pub id: String,
    pub work_item_id: u32,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl GenerationSession {
    pub fn new(work_item_id: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            work_item_id,
            status: SessionStatus::Completed,
            created_at: Utc::now(),
            completed_at: None,
            error_detail: None,
        }
    }

    pub fn completed(mut self) -> Self {
        self.status = SessionStatus::Completed;
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn queued(mut self) -> Self {
        self.status = SessionStatus::Queued;
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn failed(mut self, detail: impl Into<String>) -> Self {
        self.status = SessionStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error_detail = Some(detail.into());
        self
    }
}

/// Final response body for a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub test_generation_id: String,
    pub status: SessionStatus,
    pub generated_tests: GeneratedTests,
    pub existing_tests: ExistingTestIndex,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceability_matrix: Option<TraceabilityMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Recommendations>,
    /// Present only for queued responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gap_notes: Vec<String>,
}
