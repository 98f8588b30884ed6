//! Request orchestration.
//!
//! One entry point, [`Orchestrator::generate_tests`], drives the pipeline:
//! validate the request, resolve the work item hierarchy, gather existing
//! tests and generate new ones concurrently, build the traceability matrix
//! and recommendations, then assemble the response. The whole pipeline runs
//! under a single deadline and a per-request tracker call budget. Session
//! and audit persistence happens after the response is built and never
//! blocks or fails it.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::ado::WorkTracker;
use crate::ai::TestSynthesizer;
use crate::budget::CallBudget;
use crate::cache::{SystemClock, TtlCache};
use crate::config::{OrchestratorConfig, RequestConfig};
use crate::engine::{EngineOutcome, TestGenerationEngine};
use crate::error::{AppError, AppResult};
use crate::existing::ExistingTestAggregator;
use crate::hierarchy::{HierarchyResolver, ResolvedHierarchy};
use crate::models::{
    AdoConfig, CodeAnalysisInput, ExistingTestIndex, GeneratedTests, GenerationOptions,
    GenerationResponse, GenerationSession, SessionStatus,
};
use crate::retry::RetryPolicy;
use crate::storage::{AuditRecord, Storage};
use crate::traceability;

/// Inbound generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub code_analysis: CodeAnalysisInput,
    pub ado_config: AdoConfig,
    #[serde(default)]
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn validate(&self) -> AppResult<()> {
        self.code_analysis.validate()?;
        self.ado_config.validate()?;
        self.options.validate()?;
        Ok(())
    }
}

/// Drives one generation request end to end.
pub struct Orchestrator<T: WorkTracker + 'static, S: TestSynthesizer + 'static> {
    resolver: HierarchyResolver<T>,
    aggregator: ExistingTestAggregator<T>,
    engine: TestGenerationEngine<S>,
    storage: Arc<dyn Storage>,
    config: OrchestratorConfig,
}

impl<T: WorkTracker, S: TestSynthesizer> Orchestrator<T, S> {
    pub fn new(
        tracker: Arc<T>,
        synthesizer: Arc<S>,
        storage: Arc<dyn Storage>,
        request: &RequestConfig,
        config: OrchestratorConfig,
    ) -> Self {
        let cache = Arc::new(TtlCache::new(Arc::new(SystemClock)));
        Self::with_cache(tracker, synthesizer, storage, request, config, cache)
    }

    /// Build an orchestrator around an existing hierarchy cache. Used when a
    /// request carries its own tracker credential: the per-request pipeline
    /// still shares the process-wide cache, so repeat lookups for the same
    /// work item stay free regardless of which credential resolved them.
    pub fn with_cache(
        tracker: Arc<T>,
        synthesizer: Arc<S>,
        storage: Arc<dyn Storage>,
        request: &RequestConfig,
        config: OrchestratorConfig,
        cache: Arc<TtlCache<ResolvedHierarchy>>,
    ) -> Self {
        let retry = RetryPolicy::from_config(request);
        Self {
            resolver: HierarchyResolver::new(
                Arc::clone(&tracker),
                cache,
                retry.clone(),
                Duration::from_secs(config.hierarchy_ttl_secs),
            ),
            aggregator: ExistingTestAggregator::new(tracker, retry),
            engine: TestGenerationEngine::new(synthesizer),
            storage,
            config,
        }
    }

    /// Run the pipeline under the request deadline.
    #[instrument(skip_all, fields(work_item_id = request.ado_config.work_item_id))]
    pub async fn generate_tests(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        request.validate()?;

        let deadline = Duration::from_secs(self.config.deadline_secs);
        let result = tokio::time::timeout(deadline, self.run_pipeline(request))
            .await
            .map_err(|_| AppError::DeadlineExceeded {
                deadline_secs: self.config.deadline_secs,
            })
            .and_then(|r| r);

        match &result {
            Ok(response) => self.record_outcome(request, response),
            Err(e) => self.record_failure(request, e),
        }

        result
    }

    async fn run_pipeline(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        let budget = CallBudget::new(self.config.max_tracker_calls);

        let resolved = self
            .resolver
            .resolve(request.ado_config.work_item_id, &budget)
            .await?;

        // Existing-test lookup and generation are independent once the
        // hierarchy is known.
        let (existing, outcome) = tokio::join!(
            self.aggregator
                .aggregate(&resolved, &request.code_analysis, &budget),
            self.engine
                .generate(&request.code_analysis, &request.options),
        );
        let existing = existing?;
        let outcome = outcome?;

        info!(
            tracker_calls = budget.used(),
            "Pipeline upstream phase complete"
        );

        Ok(match outcome {
            EngineOutcome::Generated(cases) => {
                assemble_completed(request, resolved, existing, cases)
            }
            EngineOutcome::Queued {
                estimated_completion,
            } => assemble_queued(existing, estimated_completion),
        })
    }

    /// Persist session and audit records without blocking the response.
    fn record_outcome(&self, request: &GenerationRequest, response: &GenerationResponse) {
        let storage = Arc::clone(&self.storage);
        let mut session = GenerationSession::new(request.ado_config.work_item_id);
        session.id = response.test_generation_id.clone();
        let session = match response.status {
            SessionStatus::Queued => session.queued(),
            _ => session.completed(),
        };
        let audit = AuditRecord::new(&session.id, format!("generation_{}", session.status))
            .with_detail(format!(
                "generated={} existing={}",
                response.generated_tests.total(),
                response.existing_tests.test_cases.len()
            ));
        tokio::spawn(async move {
            if let Err(e) = storage.save_session(&session).await {
                error!(error = %e, "Failed to persist session");
            }
            if let Err(e) = storage.record_audit(&audit).await {
                error!(error = %e, "Failed to persist audit record");
            }
        });
    }

    fn record_failure(&self, request: &GenerationRequest, err: &AppError) {
        let storage = Arc::clone(&self.storage);
        let session =
            GenerationSession::new(request.ado_config.work_item_id).failed(err.to_string());
        let audit = AuditRecord::new(&session.id, "generation_failed")
            .with_detail(err.to_string());
        tokio::spawn(async move {
            if let Err(e) = storage.save_session(&session).await {
                error!(error = %e, "Failed to persist failed session");
            }
            if let Err(e) = storage.record_audit(&audit).await {
                error!(error = %e, "Failed to persist audit record");
            }
        });
    }
}

fn assemble_completed(
    request: &GenerationRequest,
    resolved: ResolvedHierarchy,
    existing: ExistingTestIndex,
    cases: Vec<crate::models::GeneratedTestCase>,
) -> GenerationResponse {
    let matrix =
        traceability::build_matrix(resolved.hierarchy, &request.code_analysis, &cases);
    let recommendations = traceability::build_recommendations(&cases, &existing, &matrix);
    let session = GenerationSession::new(request.ado_config.work_item_id).completed();
    let gap_notes = existing.gap_notes.clone();

    GenerationResponse {
        test_generation_id: session.id,
        status: SessionStatus::Completed,
        generated_tests: GeneratedTests::from_cases(cases),
        existing_tests: existing,
        traceability_matrix: Some(matrix),
        recommendations: Some(recommendations),
        estimated_completion: None,
        gap_notes,
    }
}

fn assemble_queued(
    existing: ExistingTestIndex,
    estimated_completion: chrono::DateTime<chrono::Utc>,
) -> GenerationResponse {
    let gap_notes = existing.gap_notes.clone();
    GenerationResponse {
        test_generation_id: uuid::Uuid::new_v4().to_string(),
        status: SessionStatus::Queued,
        generated_tests: GeneratedTests::default(),
        existing_tests: existing,
        traceability_matrix: None,
        recommendations: None,
        estimated_completion: Some(estimated_completion),
        gap_notes,
    }
}
