use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub ado: AdoClientConfig,
    pub ai: AiConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub orchestrator: OrchestratorConfig,
}

/// Azure DevOps (work tracker) configuration
#[derive(Debug, Clone)]
pub struct AdoClientConfig {
    pub organization: String,
    pub project: String,
    pub pat: String,
    pub base_url: String,
}

/// AI generator configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub deployment: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Upstream HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-call timeout for work-tracker requests.
    pub ado_timeout_ms: u64,
    /// Per-call timeout for the AI generator.
    pub ai_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Orchestrator pipeline limits
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Overall per-request deadline.
    pub deadline_secs: u64,
    /// Hierarchy cache validity window.
    pub hierarchy_ttl_secs: u64,
    /// Hard cap on work-tracker calls per request.
    pub max_tracker_calls: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let ado = AdoClientConfig {
            organization: env::var("AZURE_DEVOPS_ORG").map_err(|_| AppError::Config {
                message: "AZURE_DEVOPS_ORG is required".to_string(),
            })?,
            project: env::var("AZURE_DEVOPS_PROJECT").map_err(|_| AppError::Config {
                message: "AZURE_DEVOPS_PROJECT is required".to_string(),
            })?,
            pat: env::var("AZURE_DEVOPS_PAT").map_err(|_| AppError::Config {
                message: "AZURE_DEVOPS_PAT is required".to_string(),
            })?,
            base_url: env::var("AZURE_DEVOPS_BASE_URL")
                .unwrap_or_else(|_| "https://dev.azure.com".to_string()),
        };

        let ai = AiConfig {
            api_key: env::var("AI_API_KEY").map_err(|_| AppError::Config {
                message: "AI_API_KEY is required".to_string(),
            })?,
            base_url: env::var("AI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            deployment: env::var("AI_DEPLOYMENT").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/testgen.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            ado_timeout_ms: env::var("ADO_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
            ai_timeout_ms: env::var("AI_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        };

        let orchestrator = OrchestratorConfig {
            deadline_secs: env::var("REQUEST_DEADLINE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
            hierarchy_ttl_secs: env::var("HIERARCHY_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(900),
            max_tracker_calls: env::var("MAX_TRACKER_CALLS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        };

        Ok(Config {
            ado,
            ai,
            database,
            logging,
            request,
            orchestrator,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            ado_timeout_ms: 30000,
            ai_timeout_ms: 60000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            deadline_secs: 120,
            hierarchy_ttl_secs: 900,
            max_tracker_calls: 10,
        }
    }
}
