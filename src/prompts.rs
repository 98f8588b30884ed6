//! Centralized prompt definitions for AI-backed test synthesis.
//!
//! Keeping the prompt text in one module makes it easier to maintain,
//! review, and version alongside the response-parsing code.

use crate::models::{CodeAnalysisInput, GenerationOptions};

/// System prompt for the test synthesis call.
///
/// The generator must respond with JSON only; the engine rejects anything
/// that does not parse into the candidate schema.
pub const TEST_GENERATION_SYSTEM_PROMPT: &str = r#"You are a senior QA engineer generating test cases for a code change.

Your response MUST be valid JSON in this exact format:
{
  "test_cases": [
    {
      "title": "Test case title",
      "description": "Detailed description",
      "category": "API|UI|Integration|Unit|Performance|Security",
      "priority": "Critical|High|Medium|Low",
      "test_steps": [
        {
          "step_number": 1,
          "action": "Action to perform",
          "expected_result": "Expected outcome",
          "test_data": "Required test data"
        }
      ],
      "preconditions": "Prerequisites",
      "automation_feasibility": "High|Medium|Low|Manual Only",
      "estimated_duration": 15,
      "tags": ["tag1", "tag2"],
      "related_code_files": ["file1", "file2"]
    }
  ]
}

Guidelines:
- Include both positive and negative scenarios for added functionality
- Cover regressions and edge cases for modified functionality
- Verify removal for deleted functionality
- Prioritize by risk level and business impact
- Reference the changed files in related_code_files

Always respond with valid JSON only, no other text."#;

/// Build the user prompt for one component batch.
///
/// Embeds the smart impact summary, per-component method changes, dependency
/// chains, and the generation options so a single call covers the batch.
pub fn build_generation_prompt(input: &CodeAnalysisInput, options: &GenerationOptions) -> String {
    let mut prompt = String::new();

    prompt.push_str("Generate test cases for the following code change.\n\n");
    prompt.push_str(&format!("SUMMARY:\n{}\n\n", input.summary));
    prompt.push_str("CHANGED COMPONENTS:\n");

    for component in &input.changed_components {
        prompt.push_str(&format!(
            "- File: {} (risk: {:?})\n",
            component.file_path, component.risk_level
        ));
        for method in &component.methods {
            prompt.push_str(&format!(
                "    {:?} {}: {}\n",
                method.change_type, method.name, method.summary
            ));
        }
    }

    match &input.dependency_chains {
        Some(chains) if !chains.is_empty() => {
            prompt.push_str("\nDEPENDENCY CHAINS:\n");
            for chain in chains {
                prompt.push_str(&format!(
                    "- {} -> {}\n",
                    chain.file_path,
                    chain.impacted_files.join(", ")
                ));
            }
        }
        _ => prompt.push_str("\nNo dependency chains identified.\n"),
    }

    prompt.push_str(&format!("\nOVERALL RISK LEVEL: {:?}\n", input.risk_level));
    prompt.push_str(&format!(
        "\nOptions: include_api_tests={}, include_ui_tests={}, max_test_cases={}",
        options.include_api_tests, options.include_ui_tests, options.max_test_cases
    ));
    if !options.test_frameworks.is_empty() {
        prompt.push_str(&format!(
            ", test_frameworks={}",
            options.test_frameworks.join(", ")
        ));
    }
    prompt.push('\n');

    prompt
}
