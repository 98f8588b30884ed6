//! Traceability matrix and recommendation building.
//!
//! Pure functions over already-resolved data: the matrix maps every code
//! file touched by the change (or referenced by a generated test) to the
//! ids of the tests covering it, and the recommendations call out priority
//! tests, uncovered files, and automation candidates.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    AutomationFeasibility, CodeAnalysisInput, ExistingTestIndex, GeneratedTestCase,
    Recommendations, TestPriority, TraceabilityMatrix, WorkItemHierarchy,
};

/// Build the coverage matrix for a completed generation pass.
///
/// The file set is the union of the changed files and every file a
/// generated test references; changed files nothing covers stay in the map
/// with an empty id list so gaps are visible.
pub fn build_matrix(
    hierarchy: WorkItemHierarchy,
    input: &CodeAnalysisInput,
    generated: &[GeneratedTestCase],
) -> TraceabilityMatrix {
    let mut files: BTreeSet<String> = input
        .changed_components
        .iter()
        .map(|c| c.file_path.clone())
        .collect();
    for case in generated {
        files.extend(case.related_code_files.iter().cloned());
    }

    let mut test_coverage_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in files {
        let covering: Vec<String> = generated
            .iter()
            .filter(|case| case.related_code_files.iter().any(|f| f == &file))
            .map(|case| case.id.clone())
            .collect();
        test_coverage_map.insert(file, covering);
    }

    TraceabilityMatrix {
        work_item_hierarchy: hierarchy,
        test_coverage_map,
    }
}

/// Derive recommendations from the generated batch, the existing-test
/// index, and the coverage matrix.
pub fn build_recommendations(
    generated: &[GeneratedTestCase],
    existing: &ExistingTestIndex,
    matrix: &TraceabilityMatrix,
) -> Recommendations {
    let existing_titles: BTreeSet<String> = existing
        .test_cases
        .iter()
        .map(|c| c.test_case.title.to_lowercase())
        .collect();

    // Ids of Critical and High cases the tracker does not already know by
    // title. Ids cross-reference the coverage matrix entries.
    let priority_tests = generated
        .iter()
        .filter(|case| {
            matches!(case.priority, TestPriority::Critical | TestPriority::High)
                && !existing_titles.contains(&case.title.to_lowercase())
        })
        .map(|case| case.id.clone())
        .collect();

    let coverage_gaps = matrix
        .test_coverage_map
        .iter()
        .filter(|(_, tests)| tests.is_empty())
        .map(|(file, _)| file.clone())
        .collect();

    let automation_candidates = generated
        .iter()
        .filter(|case| {
            matches!(
                case.automation_feasibility,
                AutomationFeasibility::High | AutomationFeasibility::Medium
            )
        })
        .map(|case| case.id.clone())
        .collect();

    Recommendations {
        priority_tests,
        coverage_gaps,
        automation_candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AdoTestCase, ChangedComponent, IndexedTestCase, RiskLevel, TestCategory, TestProvenance,
        TestStep,
    };

    fn input(files: &[&str]) -> CodeAnalysisInput {
        CodeAnalysisInput {
            summary: "change".to_string(),
            changed_components: files
                .iter()
                .map(|f| ChangedComponent {
                    file_path: f.to_string(),
                    methods: vec![],
                    risk_level: RiskLevel::Medium,
                    ui_component: false,
                })
                .collect(),
            dependency_chains: None,
            risk_level: RiskLevel::Medium,
        }
    }

    fn case(
        title: &str,
        priority: TestPriority,
        feasibility: AutomationFeasibility,
        files: &[&str],
    ) -> GeneratedTestCase {
        GeneratedTestCase::new(
            title,
            "description",
            priority,
            TestCategory::Api,
            vec![TestStep {
                step_number: 1,
                action: "do".to_string(),
                expected_result: "done".to_string(),
                test_data: None,
            }],
            None,
            feasibility,
            files.iter().map(|f| f.to_string()).collect(),
        )
    }

    fn existing_with_title(title: &str) -> ExistingTestIndex {
        ExistingTestIndex {
            test_cases: vec![IndexedTestCase {
                test_case: AdoTestCase {
                    id: 1,
                    title: title.to_string(),
                    state: "Design".to_string(),
                    assigned_to: None,
                    area_path: String::new(),
                    iteration_path: String::new(),
                    test_suite_id: None,
                    last_execution_outcome: None,
                },
                provenance: vec![TestProvenance::Linked],
            }],
            suites: vec![],
            gap_notes: vec![],
        }
    }

    #[test]
    fn test_matrix_covers_union_of_files() {
        let generated = vec![case(
            "Verify login",
            TestPriority::High,
            AutomationFeasibility::High,
            &["auth/login.py", "auth/session.py"],
        )];
        let matrix = build_matrix(
            WorkItemHierarchy::default(),
            &input(&["auth/login.py", "docs/readme.md"]),
            &generated,
        );

        // Changed files plus referenced files, gaps included.
        assert_eq!(matrix.test_coverage_map.len(), 3);
        assert_eq!(matrix.test_coverage_map["auth/login.py"].len(), 1);
        assert_eq!(matrix.test_coverage_map["auth/session.py"].len(), 1);
        assert!(matrix.test_coverage_map["docs/readme.md"].is_empty());
    }

    #[test]
    fn test_matrix_ids_match_generated_cases() {
        let generated = vec![
            case("a", TestPriority::High, AutomationFeasibility::High, &["f1"]),
            case("b", TestPriority::Low, AutomationFeasibility::Low, &["f1"]),
        ];
        let matrix = build_matrix(WorkItemHierarchy::default(), &input(&["f1"]), &generated);
        assert_eq!(
            matrix.test_coverage_map["f1"],
            vec![generated[0].id.clone(), generated[1].id.clone()]
        );
    }

    #[test]
    fn test_priority_recommendations_skip_known_titles() {
        let generated = vec![
            case(
                "Verify login",
                TestPriority::Critical,
                AutomationFeasibility::High,
                &["f1"],
            ),
            case(
                "Verify logout",
                TestPriority::High,
                AutomationFeasibility::High,
                &["f1"],
            ),
            case(
                "Tidy helper",
                TestPriority::Low,
                AutomationFeasibility::High,
                &["f1"],
            ),
        ];
        let existing = existing_with_title("VERIFY LOGIN");
        let matrix = build_matrix(WorkItemHierarchy::default(), &input(&["f1"]), &generated);
        let recs = build_recommendations(&generated, &existing, &matrix);

        // Title comparison is case-insensitive; low priority is excluded.
        // The recommendation carries the case id, not its title.
        assert_eq!(recs.priority_tests, vec![generated[1].id.clone()]);
        assert!(matrix.test_coverage_map["f1"].contains(&recs.priority_tests[0]));
    }

    #[test]
    fn test_coverage_gaps_and_automation_candidates() {
        let generated = vec![
            case("auto", TestPriority::High, AutomationFeasibility::Medium, &["f1"]),
            case(
                "manual",
                TestPriority::High,
                AutomationFeasibility::ManualOnly,
                &["f1"],
            ),
        ];
        let existing = ExistingTestIndex::default();
        let matrix = build_matrix(
            WorkItemHierarchy::default(),
            &input(&["f1", "f2"]),
            &generated,
        );
        let recs = build_recommendations(&generated, &existing, &matrix);

        assert_eq!(recs.coverage_gaps, vec!["f2"]);
        assert_eq!(recs.automation_candidates, vec![generated[0].id.clone()]);
    }
}
