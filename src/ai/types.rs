use serde::Deserialize;

/// Envelope the synthesizer is prompted to return.
#[derive(Debug, Deserialize)]
pub struct CandidateBatch {
    #[serde(default)]
    pub test_cases: Vec<CandidateTest>,
}

/// One candidate test case as returned by the model.
///
/// Fields are lenient: the model occasionally omits optional fields or
/// uses unexpected casing for enum values, so everything beyond the title
/// defaults and enum fields stay strings until the engine normalizes them.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateTest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub test_steps: Vec<CandidateStep>,
    #[serde(default)]
    pub preconditions: Option<String>,
    #[serde(default)]
    pub automation_feasibility: Option<String>,
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_code_files: Vec<String>,
}

/// One candidate step; numbering is ignored and reassigned by the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateStep {
    #[serde(default)]
    pub step_number: u32,
    pub action: String,
    #[serde(default)]
    pub expected_result: String,
    #[serde(default)]
    pub test_data: Option<String>,
}

/// Chat-completions response shapes.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub content: String,
}
