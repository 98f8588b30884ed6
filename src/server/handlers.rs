//! Tool call routing and handlers.

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use super::SharedState;
use crate::error::{AppError, ErrorBody};
use crate::orchestrator::GenerationRequest;
use crate::storage::Storage;

fn default_session_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
struct SessionGetParams {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct SessionListParams {
    #[serde(default = "default_session_limit")]
    limit: u32,
}

/// Route a tool call to its handler. Errors come back as structured
/// [`ErrorBody`] payloads ready to serialize into the tool result.
pub async fn handle_tool_call(
    state: &SharedState,
    name: &str,
    arguments: Option<Value>,
) -> Result<Value, ErrorBody> {
    let request_id = Uuid::new_v4().to_string();

    let result = match name {
        "generate_tests" => handle_generate_tests(state, arguments).await,
        "generation_session_get" => handle_session_get(state, arguments).await,
        "generation_session_list" => handle_session_list(state, arguments).await,
        _ => Err(AppError::InvalidRequest {
            message: format!("Unknown tool: {}", name),
        }),
    };

    result.map_err(|e| {
        error!(tool = %name, request_id = %request_id, error = %e, "Tool call failed");
        ErrorBody::from_error(&e, request_id)
    })
}

async fn handle_generate_tests(
    state: &SharedState,
    arguments: Option<Value>,
) -> Result<Value, AppError> {
    let request: GenerationRequest = parse_args(arguments)?;
    info!(
        work_item_id = request.ado_config.work_item_id,
        components = request.code_analysis.changed_components.len(),
        scoped_credential = request.ado_config.pat.is_some(),
        "Handling generate_tests"
    );

    // A request-supplied credential is forwarded opaquely to the work
    // tracker; everything else runs on the configured credential.
    let response = match request.ado_config.pat.as_deref() {
        Some(pat) => {
            state
                .scoped_orchestrator(pat)
                .generate_tests(&request)
                .await?
        }
        None => state.orchestrator.generate_tests(&request).await?,
    };
    to_value(&response)
}

async fn handle_session_get(
    state: &SharedState,
    arguments: Option<Value>,
) -> Result<Value, AppError> {
    let params: SessionGetParams = parse_args(arguments)?;
    let session = state.storage.get_session(&params.session_id).await?;
    to_value(&session)
}

async fn handle_session_list(
    state: &SharedState,
    arguments: Option<Value>,
) -> Result<Value, AppError> {
    let params: SessionListParams = match arguments {
        Some(args) => parse_args(Some(args))?,
        None => SessionListParams {
            limit: default_session_limit(),
        },
    };
    let sessions = state
        .storage
        .list_recent_sessions(params.limit.min(100))
        .await?;
    to_value(&sessions)
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Option<Value>) -> Result<T, AppError> {
    let args = arguments.ok_or_else(|| AppError::InvalidRequest {
        message: "Missing tool arguments".to_string(),
    })?;
    serde_json::from_value(args).map_err(|e| AppError::InvalidRequest {
        message: format!("Invalid tool arguments: {}", e),
    })
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal {
        message: format!("Failed to serialize result: {}", e),
    })
}
