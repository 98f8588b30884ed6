use std::str::FromStr;

use pretty_assertions::assert_eq;

use super::*;

fn step(action: &str) -> TestStep {
    TestStep {
        step_number: 99,
        action: action.to_string(),
        expected_result: "ok".to_string(),
        test_data: None,
    }
}

#[test]
fn test_work_item_type_roundtrip() {
    for (s, t) in [
        ("Task", WorkItemType::Task),
        ("User Story", WorkItemType::UserStory),
        ("Feature", WorkItemType::Feature),
        ("Epic", WorkItemType::Epic),
    ] {
        assert_eq!(WorkItemType::from_str(s).unwrap(), t);
        assert_eq!(t.to_string(), s);
    }
    assert!(WorkItemType::from_str("Bug").is_err());
}

#[test]
fn test_hierarchy_record_by_type() {
    let mut hierarchy = WorkItemHierarchy::default();
    hierarchy.record(WorkItemNode {
        id: 1,
        work_item_type: WorkItemType::Task,
        title: "Task".to_string(),
        state: None,
        acceptance_criteria: None,
    });
    hierarchy.record(WorkItemNode {
        id: 2,
        work_item_type: WorkItemType::UserStory,
        title: "Story".to_string(),
        state: None,
        acceptance_criteria: None,
    });
    hierarchy.record(WorkItemNode {
        id: 3,
        work_item_type: WorkItemType::Epic,
        title: "Epic".to_string(),
        state: None,
        acceptance_criteria: None,
    });

    assert_eq!(hierarchy.tasks.len(), 1);
    assert_eq!(hierarchy.user_story.as_ref().unwrap().id, 2);
    assert_eq!(hierarchy.epic.as_ref().unwrap().id, 3);
    assert!(hierarchy.feature.is_none());
    assert_eq!(hierarchy.node_count(), 3);
}

#[test]
fn test_priority_rank_ordering() {
    assert!(TestPriority::Critical.rank() < TestPriority::High.rank());
    assert!(TestPriority::High.rank() < TestPriority::Medium.rank());
    assert!(TestPriority::Medium.rank() < TestPriority::Low.rank());
    assert_eq!(TestPriority::Critical.ado_priority(), 1);
    assert_eq!(TestPriority::Low.ado_priority(), 4);
}

#[test]
fn test_priority_parse_case_insensitive() {
    assert_eq!(TestPriority::from_str("critical").unwrap(), TestPriority::Critical);
    assert_eq!(TestPriority::from_str("HIGH").unwrap(), TestPriority::High);
    assert!(TestPriority::from_str("urgent").is_err());
}

#[test]
fn test_automation_feasibility_parse() {
    assert_eq!(
        AutomationFeasibility::from_str("Manual Only").unwrap(),
        AutomationFeasibility::ManualOnly
    );
    assert_eq!(
        AutomationFeasibility::from_str("medium").unwrap(),
        AutomationFeasibility::Medium
    );
    assert_eq!(AutomationFeasibility::ManualOnly.to_string(), "Manual Only");
}

#[test]
fn test_category_serde_renames() {
    let json = serde_json::to_string(&TestCategory::Api).unwrap();
    assert_eq!(json, "\"API\"");
    let json = serde_json::to_string(&TestCategory::Ui).unwrap();
    assert_eq!(json, "\"UI\"");
    let parsed: TestCategory = serde_json::from_str("\"Integration\"").unwrap();
    assert_eq!(parsed, TestCategory::Integration);
}

#[test]
fn test_renumber_steps_no_gaps() {
    let steps = vec![step("a"), step("b"), step("c")];
    let renumbered = renumber_steps(steps);
    let numbers: Vec<u32> = renumbered.iter().map(|s| s.step_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn test_generated_test_case_bounds() {
    let long_title = "t".repeat(500);
    let long_description = "d".repeat(5000);
    let case = GeneratedTestCase::new(
        long_title,
        long_description,
        TestPriority::High,
        TestCategory::Api,
        vec![step("do"), step("check")],
        None,
        AutomationFeasibility::Medium,
        vec!["src/api.rs".to_string()],
    );

    assert_eq!(case.title.len(), MAX_TITLE_LEN);
    assert_eq!(case.description.len(), MAX_DESCRIPTION_LEN);
    assert_eq!(case.test_steps[0].step_number, 1);
    assert_eq!(case.test_steps[1].step_number, 2);
    assert!(!case.id.is_empty());
}

#[test]
fn test_title_truncation_respects_char_boundaries() {
    // A two-byte character straddling the byte limit is dropped whole
    // instead of panicking on a mid-character cut.
    let mut title = "t".repeat(MAX_TITLE_LEN - 1);
    title.push('é');
    let case = GeneratedTestCase::new(
        title,
        "d",
        TestPriority::High,
        TestCategory::Api,
        vec![step("do")],
        None,
        AutomationFeasibility::Medium,
        vec![],
    );
    assert_eq!(case.title.len(), MAX_TITLE_LEN - 1);
    assert!(case.title.is_char_boundary(case.title.len()));

    // Entirely multibyte content stays within the bound and intact.
    let case = GeneratedTestCase::new(
        "あ".repeat(100),
        "あ".repeat(400),
        TestPriority::High,
        TestCategory::Api,
        vec![step("do")],
        None,
        AutomationFeasibility::Medium,
        vec![],
    );
    assert!(case.title.len() <= MAX_TITLE_LEN);
    assert!(case.description.len() <= MAX_DESCRIPTION_LEN);
    assert!(case.title.chars().all(|c| c == 'あ'));
}

#[test]
fn test_generated_tests_bucketing() {
    let make = |category| {
        GeneratedTestCase::new(
            "t",
            "d",
            TestPriority::Medium,
            category,
            vec![step("a")],
            None,
            AutomationFeasibility::High,
            vec![],
        )
    };

    let tests = GeneratedTests::from_cases(vec![
        make(TestCategory::Api),
        make(TestCategory::Ui),
        make(TestCategory::Integration),
        make(TestCategory::Security),
    ]);

    assert_eq!(tests.api_tests.len(), 1);
    assert_eq!(tests.ui_tests.len(), 1);
    // Non-API, non-UI categories land in the integration bucket.
    assert_eq!(tests.integration_tests.len(), 2);
    assert_eq!(tests.total(), 4);
    assert_eq!(tests.iter().count(), 4);
}

#[test]
fn test_options_validation_bounds() {
    let mut options = GenerationOptions::default();
    assert!(options.validate().is_ok());
    assert_eq!(options.max_test_cases, 20);

    options.max_test_cases = 0;
    assert!(options.validate().is_err());

    options.max_test_cases = 51;
    assert!(options.validate().is_err());

    options.max_test_cases = 50;
    assert!(options.validate().is_ok());
}

#[test]
fn test_options_defaults_from_empty_json() {
    let options: GenerationOptions = serde_json::from_str("{}").unwrap();
    assert!(options.include_ui_tests);
    assert!(options.include_api_tests);
    assert_eq!(options.max_test_cases, 20);
    assert!(options.test_frameworks.is_empty());
}

#[test]
fn test_input_validation() {
    let component = ChangedComponent {
        file_path: "src/lib.rs".to_string(),
        methods: vec![],
        risk_level: RiskLevel::Low,
        ui_component: false,
    };

    let input = CodeAnalysisInput {
        summary: "change".to_string(),
        changed_components: vec![component.clone()],
        dependency_chains: None,
        risk_level: RiskLevel::Medium,
    };
    assert!(input.validate().is_ok());

    let empty_summary = CodeAnalysisInput {
        summary: "  ".to_string(),
        ..input.clone()
    };
    assert!(empty_summary.validate().is_err());

    let no_components = CodeAnalysisInput {
        changed_components: vec![],
        ..input
    };
    assert!(no_components.validate().is_err());
}

#[test]
fn test_ado_config_validation() {
    let config = AdoConfig {
        work_item_id: 0,
        project_name: None,
        organization: None,
        pat: None,
    };
    assert!(config.validate().is_err());

    let config = AdoConfig {
        work_item_id: 1234,
        project_name: Some("Project".to_string()),
        organization: None,
        pat: None,
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_ado_config_credential_not_echoed() {
    let config: AdoConfig = serde_json::from_value(serde_json::json!({
        "work_item_id": 7,
        "pat": "secret-pat"
    }))
    .unwrap();
    assert_eq!(config.pat.as_deref(), Some("secret-pat"));

    // The credential is accepted on the way in but never written back out.
    let value = serde_json::to_value(&config).unwrap();
    assert!(value.get("pat").is_none());
}

#[test]
fn test_session_transitions() {
    let session = GenerationSession::new(42);
    assert_eq!(session.work_item_id, 42);
    assert!(session.completed_at.is_none());

    let done = session.clone().completed();
    assert_eq!(done.status, SessionStatus::Completed);
    assert!(done.completed_at.is_some());

    let failed = session.clone().failed("upstream down");
    assert_eq!(failed.status, SessionStatus::Failed);
    assert_eq!(failed.error_detail.as_deref(), Some("upstream down"));

    let queued = session.queued();
    assert_eq!(queued.status, SessionStatus::Queued);
}

#[test]
fn test_session_status_roundtrip() {
    for status in [
        SessionStatus::Completed,
        SessionStatus::Queued,
        SessionStatus::Failed,
    ] {
        let s = status.to_string();
        assert_eq!(SessionStatus::from_str(&s).unwrap(), status);
    }
}
