//! Test case generation engine.
//!
//! Prefers AI synthesis and falls back to deterministic templates when the
//! generator is unavailable; a rate-limited generator queues the request
//! instead. Every produced case is normalized the same way regardless of
//! origin: bounded title and description, steps renumbered from 1, and the
//! batch ordered by priority before truncation to the requested maximum.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{info, instrument, warn};

use crate::ai::{CandidateTest, TestSynthesizer};
use crate::classify;
use crate::error::{AiError, AppResult};
use crate::models::{
    AutomationFeasibility, ChangeType, ChangedComponent, CodeAnalysisInput, GeneratedTestCase,
    GenerationOptions, MethodChange, TestCategory, TestPriority, TestStep,
};
use crate::prompts;

/// Wait hint applied to queued responses when the generator gives none.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Result of one generation pass.
#[derive(Debug)]
pub enum EngineOutcome {
    /// Cases were produced, by the AI generator or the template catalog.
    Generated(Vec<GeneratedTestCase>),
    /// The generator is rate limited; the caller should retry later.
    Queued { estimated_completion: DateTime<Utc> },
}

/// Generates test cases for a code change.
pub struct TestGenerationEngine<S: TestSynthesizer> {
    synthesizer: Arc<S>,
}

impl<S: TestSynthesizer> TestGenerationEngine<S> {
    pub fn new(synthesizer: Arc<S>) -> Self {
        Self { synthesizer }
    }

    /// Generate test cases for the change, preferring the AI generator.
    #[instrument(skip_all, fields(components = input.changed_components.len()))]
    pub async fn generate(
        &self,
        input: &CodeAnalysisInput,
        options: &GenerationOptions,
    ) -> AppResult<EngineOutcome> {
        let user_prompt = prompts::build_generation_prompt(input, options);
        let cases = match self
            .synthesizer
            .synthesize(prompts::TEST_GENERATION_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(candidates) if !candidates.is_empty() => {
                info!(candidates = candidates.len(), "AI synthesis succeeded");
                normalize_candidates(candidates, input)
            }
            Ok(_) => {
                warn!("AI synthesis returned no candidates, using templates");
                template_catalog(input)
            }
            Err(AiError::RateLimited { retry_after_secs }) => {
                let wait = retry_after_secs.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                info!(retry_after_secs = wait, "AI generator rate limited, queueing");
                return Ok(EngineOutcome::Queued {
                    estimated_completion: Utc::now() + ChronoDuration::seconds(wait as i64),
                });
            }
            Err(e) => {
                warn!(error = %e, "AI synthesis failed, using templates");
                template_catalog(input)
            }
        };

        let cases = finalize(cases, options);
        info!(cases = cases.len(), "Generation pass complete");
        Ok(EngineOutcome::Generated(cases))
    }
}

/// Drop gated categories, order by priority, and truncate to the maximum.
fn finalize(mut cases: Vec<GeneratedTestCase>, options: &GenerationOptions) -> Vec<GeneratedTestCase> {
    cases.retain(|case| match case.category {
        TestCategory::Ui => options.include_ui_tests,
        TestCategory::Api => options.include_api_tests,
        _ => true,
    });
    // Stable sort keeps input order within a priority band, so truncation
    // always drops the lowest-priority cases first.
    cases.sort_by_key(|case| case.priority.rank());
    cases.truncate(options.max_test_cases);
    cases
}

/// Turn raw AI candidates into normalized test cases. Unparseable enum
/// fields fall back to defaults rather than rejecting the candidate.
fn normalize_candidates(
    candidates: Vec<CandidateTest>,
    input: &CodeAnalysisInput,
) -> Vec<GeneratedTestCase> {
    let fallback_files: Vec<String> = input
        .changed_components
        .iter()
        .map(|c| c.file_path.clone())
        .collect();

    candidates
        .into_iter()
        .filter(|candidate| !candidate.title.trim().is_empty())
        .map(|candidate| {
            let priority = candidate
                .priority
                .as_deref()
                .and_then(|s| TestPriority::from_str(s).ok())
                .unwrap_or(TestPriority::Medium);
            let category = candidate
                .category
                .as_deref()
                .and_then(|s| TestCategory::from_str(s).ok())
                .unwrap_or(TestCategory::Integration);
            let feasibility = candidate
                .automation_feasibility
                .as_deref()
                .and_then(|s| AutomationFeasibility::from_str(s).ok())
                .unwrap_or(AutomationFeasibility::Medium);

            let steps = candidate
                .test_steps
                .into_iter()
                .map(|s| TestStep {
                    step_number: s.step_number,
                    action: s.action,
                    expected_result: s.expected_result,
                    test_data: s.test_data,
                })
                .collect();

            let related = if candidate.related_code_files.is_empty() {
                fallback_files.clone()
            } else {
                candidate.related_code_files
            };

            let mut case = GeneratedTestCase::new(
                candidate.title,
                candidate.description,
                priority,
                category,
                steps,
                candidate.preconditions,
                feasibility,
                related,
            )
            .with_tags(candidate.tags);
            if let Some(minutes) = candidate.estimated_duration {
                case = case.with_estimated_duration(minutes);
            }
            case
        })
        .collect()
}

/// Deterministic template catalog used when the AI generator is down.
///
/// Added methods get a positive and a negative case, modified methods a
/// regression and an edge case, removed methods a removal check. Template
/// cases never claim better than Medium automation feasibility.
fn template_catalog(input: &CodeAnalysisInput) -> Vec<GeneratedTestCase> {
    let mut cases = Vec::new();
    for component in &input.changed_components {
        for method in &component.methods {
            match method.change_type {
                ChangeType::Added => {
                    cases.push(template_case(
                        component,
                        method,
                        format!("Verify {} succeeds with valid input", method.name),
                        format!(
                            "Exercise the new {} behavior in {} with representative valid input.",
                            method.name, component.file_path
                        ),
                        vec![
                            step("Invoke the new functionality with valid input", "The operation completes successfully"),
                            step("Inspect the resulting state", "State reflects the documented new behavior"),
                        ],
                        "positive",
                    ));
                    cases.push(template_case(
                        component,
                        method,
                        format!("Verify {} rejects invalid input", method.name),
                        format!(
                            "Exercise the new {} behavior in {} with malformed and boundary input.",
                            method.name, component.file_path
                        ),
                        vec![
                            step("Invoke the new functionality with invalid input", "The operation is rejected with a clear error"),
                            step("Inspect the resulting state", "No partial changes were applied"),
                        ],
                        "negative",
                    ));
                }
                ChangeType::Modified => {
                    cases.push(template_case(
                        component,
                        method,
                        format!("Verify existing behavior of {} is preserved", method.name),
                        format!(
                            "Regression check that the change to {} in {} keeps previously working flows intact.",
                            method.name, component.file_path
                        ),
                        vec![
                            step("Run the pre-change happy path", "Behavior matches the previously documented outcome"),
                            step("Compare outputs against the prior release", "No unintended differences"),
                        ],
                        "regression",
                    ));
                    cases.push(template_case(
                        component,
                        method,
                        format!("Verify {} handles edge cases after the change", method.name),
                        format!(
                            "Probe boundary conditions of the modified {} in {}.",
                            method.name, component.file_path
                        ),
                        vec![
                            step("Invoke with boundary and empty input", "Each case is handled without error or data loss"),
                        ],
                        "edge-case",
                    ));
                }
                ChangeType::Removed => {
                    cases.push(template_case(
                        component,
                        method,
                        format!("Verify {} is no longer reachable", method.name),
                        format!(
                            "Confirm the removal of {} from {} is complete and callers degrade cleanly.",
                            method.name, component.file_path
                        ),
                        vec![
                            step("Attempt to invoke the removed functionality", "The call fails or is absent"),
                            step("Exercise former callers", "They handle the removal without crashing"),
                        ],
                        "removal",
                    ));
                }
            }
        }
    }
    cases
}

fn template_case(
    component: &ChangedComponent,
    method: &MethodChange,
    title: String,
    description: String,
    steps: Vec<TestStep>,
    pattern_tag: &str,
) -> GeneratedTestCase {
    let (priority, category) = classify::classify(component, method);
    let feasibility = match category {
        TestCategory::Ui => AutomationFeasibility::Low,
        _ => AutomationFeasibility::Medium,
    };
    GeneratedTestCase::new(
        title,
        description,
        priority,
        category,
        steps,
        None,
        feasibility,
        vec![component.file_path.clone()],
    )
    .with_tags(vec!["template".to_string(), pattern_tag.to_string()])
}

fn step(action: &str, expected: &str) -> TestStep {
    TestStep {
        step_number: 0,
        action: action.to_string(),
        expected_result: expected.to_string(),
        test_data: None,
    }
}
